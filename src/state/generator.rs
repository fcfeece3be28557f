use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

/// Symbols a join code is drawn from; look-alikes `0`, `1`, `I` and `O` are left out.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Number of symbols in a join code.
pub const CODE_LENGTH: usize = 6;

/// Majority and minority words handed out for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPair {
    /// Word given to every regular player.
    pub normal: String,
    /// Word given to the mafia.
    pub mafia: String,
}

impl WordPair {
    /// Build a pair from borrowed words.
    pub fn new(normal: &str, mafia: &str) -> Self {
        Self {
            normal: normal.to_owned(),
            mafia: mafia.to_owned(),
        }
    }

    /// A usable pair has two non-blank words that differ.
    pub fn is_valid(&self) -> bool {
        let normal = self.normal.trim();
        let mafia = self.mafia.trim();
        !normal.is_empty() && !mafia.is_empty() && normal != mafia
    }
}

const DEFAULT_PAIRS: [(&str, &str); 20] = [
    ("Apple", "Orange"),
    ("Dog", "Cat"),
    ("Beach", "Mountain"),
    ("Summer", "Winter"),
    ("Coffee", "Tea"),
    ("Pizza", "Burger"),
    ("Soccer", "Basketball"),
    ("Movie", "Book"),
    ("Guitar", "Piano"),
    ("Car", "Bicycle"),
    ("Morning", "Evening"),
    ("Sun", "Moon"),
    ("River", "Lake"),
    ("Forest", "Desert"),
    ("Pencil", "Pen"),
    ("Shirt", "Pants"),
    ("Happy", "Sad"),
    ("Fast", "Slow"),
    ("Hot", "Cold"),
    ("Sweet", "Sour"),
];

/// Built-in word catalog.
pub fn default_word_pairs() -> Vec<WordPair> {
    DEFAULT_PAIRS
        .iter()
        .map(|(normal, mafia)| WordPair::new(normal, mafia))
        .collect()
}

/// Draw a join code, each symbol picked independently and uniformly.
pub fn generate_game_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

/// Pick one pair uniformly from `catalog`, falling back to the built-in
/// catalog when it is empty.
pub fn generate_word_pair<R: Rng + ?Sized>(catalog: &[WordPair], rng: &mut R) -> WordPair {
    match catalog.choose(rng) {
        Some(pair) => pair.clone(),
        None => {
            let (normal, mafia) = DEFAULT_PAIRS[rng.random_range(0..DEFAULT_PAIRS.len())];
            WordPair::new(normal, mafia)
        }
    }
}

/// Whether `code` has the shape of a join code.
pub fn is_game_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|byte| CODE_ALPHABET.contains(&byte))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn codes_use_alphabet_and_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let code = generate_game_code(&mut rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(is_game_code(&code), "unexpected code {code}");
        }
    }

    #[test]
    fn code_symbols_are_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 32];
        let samples = 10_000;
        for _ in 0..samples {
            for byte in generate_game_code(&mut rng).bytes() {
                let index = CODE_ALPHABET
                    .iter()
                    .position(|symbol| *symbol == byte)
                    .unwrap();
                counts[index] += 1;
            }
        }

        let expected = (samples * CODE_LENGTH) as f64 / CODE_ALPHABET.len() as f64;
        let chi_square: f64 = counts
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();
        // 31 degrees of freedom; 61.1 is the 0.1% critical value.
        assert!(chi_square < 61.1, "chi-square too high: {chi_square}");
    }

    #[test]
    fn default_catalog_is_valid() {
        let catalog = default_word_pairs();
        assert_eq!(catalog.len(), 20);
        assert!(catalog.iter().all(WordPair::is_valid));
    }

    #[test]
    fn word_pair_comes_from_catalog() {
        let mut rng = StdRng::seed_from_u64(3);
        let catalog = vec![WordPair::new("Salt", "Pepper")];
        assert_eq!(
            generate_word_pair(&catalog, &mut rng),
            WordPair::new("Salt", "Pepper")
        );

        let pair = generate_word_pair(&[], &mut rng);
        assert!(default_word_pairs().contains(&pair));
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(is_game_code("ABC234"));
        assert!(!is_game_code("ABC23"));
        assert!(!is_game_code("ABC230"));
        assert!(!is_game_code("abc234"));
    }
}
