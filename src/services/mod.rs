/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Generic search/create/read/update/delete over one collection.
pub mod record_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
