pub mod answers;
pub mod boards;
pub mod cards;
pub mod hygiene;
pub mod jobs;
pub mod worker;

pub use answers::{AnswerService, ModelClient};
pub use boards::{BoardService, CreateBoardInput, CreateListInput};
pub use cards::{CardService, CreateCardInput, MoveCardInput, UpdateCardInput};
pub use hygiene::{DetectStuckInput, HygieneService, DEFAULT_STUCK_THRESHOLD_DAYS};
pub use jobs::JobService;
pub use worker::{DetectStuckHandler, EventHandler, OutboxDispatcher};
