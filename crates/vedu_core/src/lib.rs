pub mod domain;
pub mod ports;

pub use domain::{
    ClassificationResult, ComplexityAnalysis, Document, DocumentStatus, ImportantDate,
    JargonAnalysis, JargonInfo, JargonResult, ModelServiceHealth, NewDocument, NewUser, User,
    UserCredentials,
};
pub use ports::{ClassificationService, DocumentStore, PortError, PortResult, UserStore};
