/// Cross-cutting options for a single fetch, supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchContext {
    /// Materialize the resource into a local temporary file before handing
    /// back a stream over it. Fetchers may also enable this through their
    /// own configuration; either switch is sufficient.
    pub spool_to_temp: bool,
}

impl FetchContext {
    pub fn spooled() -> Self {
        FetchContext {
            spool_to_temp: true,
        }
    }
}
