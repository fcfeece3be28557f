use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB data access.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures raised while talking to MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to insert game `{code}`")]
    InsertGame {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to save game `{code}`")]
    SaveGame {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game `{code}`")]
    LoadGame {
        code: String,
        #[source]
        source: MongoError,
    },
}
