//! Orchestration layer
//!
//! ## Responsibilities
//!
//! Batch scheduling and per-item dispatch; the "control room" of the engine.
//!
//! ```text
//! batch_grader (validates, looks up questions, fans out items)
//!     ↓
//! services (capabilities: normalize / score / diff / assess / summarize)
//!     ↓
//! clients (network collaborators: LLM assessment, question bank)
//! ```
//!
//! ## Design principles
//!
//! 1. **Single responsibility**: the orchestrator schedules and contains
//!    failures; it owns no scoring rules
//! 2. **Bounded concurrency**: Semaphore-guarded task pool sized by config,
//!    independent of batch size
//! 3. **Order preservation**: results are placed by input position
//! 4. **Containment**: only validation and missing questions are fatal

pub mod batch_grader;

pub use batch_grader::{BatchGrader, GradeOptions};
