use scf::ScfError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported input file extension `{0}`, expected .yaml, .yml, .json or .toml")]
    UnsupportedExtension(String),

    #[error("invalid solvent model `{0}`, expected ddCOSMO or ddPCM")]
    InvalidSolventModel(String),

    #[error("solvent model can be applied to a mean-field object only, got {0}")]
    SolventTarget(String),

    #[error("cannot apply stage `{stage}` to {context}")]
    InapplicableContext { stage: String, context: String },

    #[error("{type_name} has no attribute `{attr}`")]
    UnknownAttribute { type_name: String, attr: String },

    #[error("invalid value for {type_name}.{attr}: {reason}")]
    InvalidAttribute {
        type_name: String,
        attr: String,
        reason: String,
    },

    #[error("malformed path `{path}`: {reason}")]
    PathSyntax { path: String, reason: String },

    #[error("index {index} out of range for `{path}` of length {len}")]
    IndexOutOfRange { path: String, index: i64, len: usize },

    #[error("`{0}` resolves to an object, not a value")]
    NotAValue(String),

    #[error("`{0}` is not callable")]
    NotCallable(String),

    #[error("invalid stage key `{key}`: {reason}")]
    InvalidStageKey { key: String, reason: String },

    #[error("invalid body for stage `{stage}`: {reason}")]
    InvalidBody { stage: String, reason: String },

    #[error("template substitution failed: {0}")]
    Template(String),

    #[error("invalid substitution `{0}`, expected key=value")]
    InvalidSubstitution(String),

    #[error("cannot parse {format} document: {reason}")]
    Parse { format: &'static str, reason: String },

    #[error("cannot serialise results as {format}: {reason}")]
    Serialize { format: &'static str, reason: String },

    #[error("unknown module `{0}`")]
    UnknownModule(String),

    #[error("not supported by the native backend: {0}")]
    Unsupported(String),

    #[error("cannot set up logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Scf(#[from] ScfError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
