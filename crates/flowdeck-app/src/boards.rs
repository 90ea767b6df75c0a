use std::sync::Arc;

use flowdeck_core::{FlowdeckError, FlowdeckResult, RequestContext};
use flowdeck_domain::position::position_for_append;
use flowdeck_domain::validate::MAX_TITLE_LEN;
use flowdeck_domain::{Board, BoardId, EventType, List, ListId, OutboxEvent, Violations};
use flowdeck_store::BoardStore;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBoardInput {
    pub title: String,
}

impl CreateBoardInput {
    pub fn validate(&self) -> FlowdeckResult<()> {
        let mut violations = Violations::new();
        violations.require_non_empty("title", &self.title);
        violations.require_max_len("title", &self.title, MAX_TITLE_LEN);
        violations.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateListInput {
    pub board_id: BoardId,
    pub title: String,
    /// Ordering key among the board's lists; appended after existing lists
    /// when omitted.
    #[serde(default)]
    pub position: Option<f64>,
}

impl CreateListInput {
    pub fn validate(&self) -> FlowdeckResult<()> {
        let mut violations = Violations::new();
        violations.require_non_empty("title", &self.title);
        violations.require_max_len("title", &self.title, MAX_TITLE_LEN);
        if let Some(position) = self.position {
            violations.require_finite_positive("position", position);
        }
        violations.into_result()
    }
}

/// Board and list creation use-cases.
///
/// Stateless: every call carries its own RequestContext and obtains a
/// fresh transaction, so one service value is safely shared by concurrent
/// callers.
pub struct BoardService<S> {
    store: Arc<S>,
}

impl<S: BoardStore> BoardService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create_board(
        &self,
        ctx: &RequestContext,
        input: CreateBoardInput,
    ) -> FlowdeckResult<Board> {
        ctx.ensure_can_write()?;
        input.validate()?;

        let board = Board::new(ctx.org_id, input.title);
        let event = OutboxEvent::new(
            EventType::BoardCreated,
            ctx.org_id,
            board.id,
            json!({ "boardId": board.id, "actorId": ctx.user_id }),
        );

        let created = board.clone();
        self.store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    tx.create_board(board).await?;
                    tx.append_outbox(event).await?;
                    Ok(())
                })
            })
            .await?;

        tracing::info!("Created board {} ({})", created.title, created.id);
        Ok(created)
    }

    pub async fn create_list(
        &self,
        ctx: &RequestContext,
        input: CreateListInput,
    ) -> FlowdeckResult<List> {
        ctx.ensure_can_write()?;
        input.validate()?;

        let board = self.get_board(ctx, input.board_id).await?;

        let position = match input.position {
            Some(position) => position,
            None => {
                let siblings = self.store.find_lists_by_board(board.id).await?;
                let positions: Vec<f64> = siblings.iter().map(|l| l.position).collect();
                position_for_append(&positions)
            }
        };

        let list = List::new(ctx.org_id, board.id, input.title, position);
        let event = OutboxEvent::new(
            EventType::ListCreated,
            ctx.org_id,
            board.id,
            json!({ "listId": list.id, "boardId": board.id, "actorId": ctx.user_id }),
        );

        let created = list.clone();
        self.store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    tx.create_list(list).await?;
                    tx.append_outbox(event).await?;
                    Ok(())
                })
            })
            .await?;

        tracing::info!("Created list {} on board {}", created.title, created.board_id);
        Ok(created)
    }

    /// Org-scoped fetch. A board in another org is reported as not found,
    /// never as forbidden.
    pub async fn get_board(&self, ctx: &RequestContext, id: BoardId) -> FlowdeckResult<Board> {
        match self.store.find_board_by_id(id).await? {
            Some(board) if board.org_id == ctx.org_id => Ok(board),
            _ => Err(FlowdeckError::not_found("board", id)),
        }
    }

    /// Org-scoped list fetch, same absence rule as boards.
    pub async fn get_list(&self, ctx: &RequestContext, id: ListId) -> FlowdeckResult<List> {
        match self.store.find_list_by_id(id).await? {
            Some(list) if list.org_id == ctx.org_id => Ok(list),
            _ => Err(FlowdeckError::not_found("list", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_core::Role;
    use flowdeck_store::MemoryStore;
    use uuid::Uuid;

    fn editor() -> RequestContext {
        RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), Role::Editor)
    }

    fn service() -> BoardService<MemoryStore> {
        BoardService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_board_returns_version_zero_and_appends_event() {
        let service = service();
        let ctx = editor();

        let board = service
            .create_board(
                &ctx,
                CreateBoardInput {
                    title: "Launch plan".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(board.version, 0);
        assert_eq!(board.org_id, ctx.org_id);

        let events = service.store.list_unconsumed_outbox(10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::BoardCreated);
        assert_eq!(events[0].board_id, board.id);
    }

    #[tokio::test]
    async fn test_created_boards_have_distinct_ids() {
        let service = service();
        let ctx = editor();

        let a = service
            .create_board(&ctx, CreateBoardInput { title: "A".to_string() })
            .await
            .unwrap();
        let b = service
            .create_board(&ctx, CreateBoardInput { title: "B".to_string() })
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_viewer_is_forbidden_before_any_side_effect() {
        let service = service();
        let viewer = RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), Role::Viewer);

        let err = service
            .create_board(
                &viewer,
                CreateBoardInput {
                    title: "Nope".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, FlowdeckError::Forbidden(_)));
        assert!(service.store.list_unconsumed_outbox(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_title_is_a_validation_error() {
        let service = service();
        let err = service
            .create_board(&editor(), CreateBoardInput { title: "  ".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, FlowdeckError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cross_org_board_fetch_is_not_found() {
        let service = service();
        let owner = editor();
        let board = service
            .create_board(
                &owner,
                CreateBoardInput {
                    title: "Private".to_string(),
                },
            )
            .await
            .unwrap();

        let outsider = editor();
        let err = service.get_board(&outsider, board.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_lists_append_after_existing_lists() {
        let service = service();
        let ctx = editor();
        let board = service
            .create_board(
                &ctx,
                CreateBoardInput {
                    title: "Board".to_string(),
                },
            )
            .await
            .unwrap();

        let first = service
            .create_list(
                &ctx,
                CreateListInput {
                    board_id: board.id,
                    title: "Todo".to_string(),
                    position: None,
                },
            )
            .await
            .unwrap();
        let second = service
            .create_list(
                &ctx,
                CreateListInput {
                    board_id: board.id,
                    title: "Doing".to_string(),
                    position: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(first.position, 1024.0);
        assert_eq!(second.position, 2048.0);
    }

    #[tokio::test]
    async fn test_create_list_on_foreign_board_is_not_found() {
        let service = service();
        let owner = editor();
        let board = service
            .create_board(
                &owner,
                CreateBoardInput {
                    title: "Private".to_string(),
                },
            )
            .await
            .unwrap();

        let outsider = editor();
        let err = service
            .create_list(
                &outsider,
                CreateListInput {
                    board_id: board.id,
                    title: "Todo".to_string(),
                    position: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
