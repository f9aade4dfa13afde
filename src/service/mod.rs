pub mod catalog;
pub mod evaluation;
pub mod judge;
pub mod llm;

pub use catalog::RubricRegistry;
pub use evaluation::AssessmentService;
pub use judge::LlmJudge;
pub use llm::LlmClient;
