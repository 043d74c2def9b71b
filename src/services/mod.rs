pub mod access_gate;
pub mod form_script;
pub mod llm_service;
pub mod pdf_extractor;
pub mod quiz_generator;
pub mod quiz_repository;

pub use access_gate::{Access, AccessGate, AuthState};
pub use form_script::export_form_script;
pub use llm_service::{CompletionBackend, LlmService};
pub use pdf_extractor::PdfExtractor;
pub use quiz_generator::QuizGenerator;
pub use quiz_repository::QuizRepository;
