use {interleave_core::QualifiedName, std::io, thiserror::Error};

/// Boxed error returned by a [`RewritePass`](crate::RewritePass).
pub type PassError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoadError {
    /// Raised by the parent loader and propagated as is.
    #[error("class not found: {0}")]
    ClassNotFound(QualifiedName),

    /// Fatal for the unit. There is no unrewritten fallback.
    #[error("cannot instrument unit `{name}`")]
    Instrumentation {
        name: QualifiedName,
        #[source]
        source: InstrumentError,
    },
}

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("unreadable unit `{name}`")]
    UnreadableUnit {
        name: QualifiedName,
        #[source]
        source: io::Error,
    },

    #[error("malformed unit `{name}`")]
    Malformed {
        name: QualifiedName,
        #[source]
        source: serde_json::Error,
    },

    #[error("rewrite pass `{pass}` failed")]
    Pass {
        pass: String,
        #[source]
        source: PassError,
    },

    #[error("cannot write rewritten unit")]
    Write(#[from] WriteError),
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot resolve common ancestor in `{method}`")]
    Resolve {
        method: String,
        #[source]
        source: ResolveError,
    },

    #[error("duplicate label {label} in `{method}`")]
    DuplicateLabel { method: String, label: u16 },

    #[error("unknown label {label} in `{method}`")]
    UnknownLabel { method: String, label: u16 },

    #[error("stack underflow at instruction {index} of `{method}`")]
    StackUnderflow { method: String, index: usize },

    #[error(
        "inconsistent stack depth at instruction {index} of `{method}`: {expected} vs {found}"
    )]
    InconsistentStack {
        method: String,
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("control falls off the end of `{method}`")]
    FallsOffEnd { method: String },

    #[error("stack too deep in `{method}`")]
    StackTooDeep { method: String },

    #[error("cannot encode unit")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("type `{0}` not found")]
    TypeNotFound(String),

    #[error("cyclic hierarchy through `{0}`")]
    CyclicHierarchy(String),

    #[error("cannot read type `{name}`")]
    Unreadable {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed type `{name}`")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
