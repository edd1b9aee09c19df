use crate::cache::resolver::ParseLocationError;
use crate::fetch::FetchError;
use crate::record::AssembleError;
use crate::wfs::WfsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FmiWeatherError {
    #[error(transparent)]
    InvalidLocation(#[from] ParseLocationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Wfs(#[from] WfsError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}
