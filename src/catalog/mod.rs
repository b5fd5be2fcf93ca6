//! Projects and tasks the user can book against. The [fetcher::CatalogFetcher] pulls the
//! project list, fans out one task request per project and only hands out the joined result.

pub mod fetcher;
pub mod model;

pub use fetcher::{CatalogError, CatalogFetcher, FetchError, FetchStage};
pub use model::{Catalog, Project, ProjectId, Task, TaskId};
