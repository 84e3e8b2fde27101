#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("error looking up {name}: {source}")]
    Lookup {
        name: String,
        #[source]
        source: vm_driver::Error,
    },

    #[error("{name} already exists, you can use --force flag to destroy it")]
    AlreadyExists { name: String },

    #[error("error destroying {name}: {source}")]
    Destroy {
        name: String,
        #[source]
        source: vm_driver::Error,
    },

    #[error("error creating vm: {0}")]
    Create(#[source] vm_driver::Error),
}
