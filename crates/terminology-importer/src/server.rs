//! gRPC server implementation.

use std::sync::Arc;

use terminology_loader::ReleaseType;
use terminology_types::Process;
use tonic::{Request, Response, Status};

use crate::importer::{ImportKind, ImportRequest, Importer};
use crate::proto::{
    import_service_server::ImportService, CancelJobRequest, CodeStoreTarget, GetJobRequest,
    ImportLoincRequest, ImportResponse, ImportSnomedRequest, Job,
};
use crate::source::SnomedEdition;
use crate::store::{CodeStore, HttpCodeStore};

/// Terminology import gRPC server.
#[derive(Clone)]
pub struct ImporterServer {
    importer: Arc<Importer>,
}

impl ImporterServer {
    /// Creates a server submitting jobs to `importer`.
    pub fn new(importer: Importer) -> Self {
        Self {
            importer: Arc::new(importer),
        }
    }

    /// Returns the importer.
    pub fn importer(&self) -> &Importer {
        &self.importer
    }

    fn code_store(target: Option<CodeStoreTarget>) -> Result<Arc<dyn CodeStore>, Status> {
        let target = target.ok_or_else(|| Status::invalid_argument("store is required"))?;
        if target.url.trim().is_empty() {
            return Err(Status::invalid_argument("store url is required"));
        }
        Ok(Arc::new(HttpCodeStore::new(
            target.url,
            target.username,
            target.password,
        )))
    }

    fn chunk_size(value: u32) -> Option<usize> {
        (value > 0).then_some(value as usize)
    }

    fn submit(&self, request: ImportRequest) -> Result<Response<ImportResponse>, Status> {
        let id = self
            .importer
            .submit(request)
            .map_err(|e| Status::unavailable(e.to_string()))?;
        Ok(Response::new(ImportResponse { id }))
    }

    fn to_proto_job(process: Process) -> Job {
        Job {
            id: process.id,
            status: process.status.as_str().to_string(),
            queued: process.queued,
            started: process.started,
            upload_started: process.upload_started,
            uploaded: process.uploaded,
            total: process.total,
            eta: process.eta,
            stacktrace: process.stacktrace,
            message: process.message,
        }
    }

    fn not_found(id: &str) -> Status {
        Status::not_found(format!("No job with id {}", id))
    }
}

#[tonic::async_trait]
impl ImportService for ImporterServer {
    async fn import_snomed(
        &self,
        request: Request<ImportSnomedRequest>,
    ) -> Result<Response<ImportResponse>, Status> {
        let req = request.into_inner();

        let release_type = ReleaseType::parse(&req.release_type)
            .ok_or_else(|| Status::invalid_argument("releaseType should be either delta or snapshot"))?;
        let edition = SnomedEdition::parse(&req.edition)
            .ok_or_else(|| Status::invalid_argument("region should be either int or be"))?;
        let store = Self::code_store(req.store)?;

        self.submit(ImportRequest {
            kind: ImportKind::Snomed {
                edition,
                release_type,
            },
            store,
            chunk_size: Self::chunk_size(req.chunk_size),
        })
    }

    async fn import_loinc(
        &self,
        request: Request<ImportLoincRequest>,
    ) -> Result<Response<ImportResponse>, Status> {
        let req = request.into_inner();
        let store = Self::code_store(req.store)?;

        self.submit(ImportRequest {
            kind: ImportKind::Loinc,
            store,
            chunk_size: Self::chunk_size(req.chunk_size),
        })
    }

    async fn get_job(&self, request: Request<GetJobRequest>) -> Result<Response<Job>, Status> {
        let id = request.into_inner().id;
        let process = self.importer.status(&id).ok_or_else(|| Self::not_found(&id))?;
        Ok(Response::new(Self::to_proto_job(process)))
    }

    async fn cancel_job(&self, request: Request<CancelJobRequest>) -> Result<Response<Job>, Status> {
        let id = request.into_inner().id;
        let process = self
            .importer
            .request_cancel(&id)
            .ok_or_else(|| Self::not_found(&id))?;
        Ok(Response::new(Self::to_proto_job(process)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImporterConfig;
    use tonic::Code;

    fn server() -> (ImporterServer, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ImporterConfig {
            base_folder: dir.path().to_path_buf(),
            ..ImporterConfig::default()
        };
        (ImporterServer::new(Importer::new(config)), dir)
    }

    fn target() -> Option<CodeStoreTarget> {
        Some(CodeStoreTarget {
            url: "http://127.0.0.1:9".to_string(),
            username: "user".to_string(),
            password: "secret".to_string(),
        })
    }

    fn snomed(release_type: &str, edition: &str) -> Request<ImportSnomedRequest> {
        Request::new(ImportSnomedRequest {
            release_type: release_type.to_string(),
            edition: edition.to_string(),
            store: target(),
            chunk_size: 0,
        })
    }

    #[tokio::test]
    async fn test_import_snomed_validates_arguments() {
        let (server, _dir) = server();

        let err = server.import_snomed(snomed("full", "int")).await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.message(), "releaseType should be either delta or snapshot");

        let err = server.import_snomed(snomed("delta", "fr")).await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.message(), "region should be either int or be");

        let err = server
            .import_loinc(Request::new(ImportLoincRequest {
                store: None,
                chunk_size: 0,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
        assert!(server.importer().registry().is_empty());
    }

    #[tokio::test]
    async fn test_submitted_job_is_queryable() {
        let (server, _dir) = server();

        let id = server
            .import_snomed(snomed("snapshot", "be"))
            .await
            .unwrap()
            .into_inner()
            .id;

        let job = server
            .get_job(Request::new(GetJobRequest { id: id.clone() }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(job.id, id);
        assert!(job.queued > 0);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let (server, _dir) = server();

        let err = server
            .get_job(Request::new(GetJobRequest {
                id: "missing".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);

        let err = server
            .cancel_job(Request::new(CancelJobRequest {
                id: "missing".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    #[test]
    fn test_job_conversion() {
        let mut process = Process::queued("job-1", 10);
        process.eta = Some(99);
        process.message = Some("Uploading 3 codes".to_string());

        let job = ImporterServer::to_proto_job(process);
        assert_eq!(job.status, "QUEUED");
        assert_eq!(job.queued, 10);
        assert_eq!(job.eta, Some(99));
        assert_eq!(job.started, None);
        assert_eq!(job.message.as_deref(), Some("Uploading 3 codes"));
    }
}
