use fedquery_resolver::ResolveError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error("invalid resolver options")]
    #[diagnostic(code(fedquery::options))]
    Options(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
