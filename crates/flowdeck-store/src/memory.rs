//! In-memory store used by tests and local development.
//!
//! A transaction clones the current state, applies every mutation and
//! outbox append to the clone, and swaps the clone back only when the work
//! closure returns Ok. The lock is held across the whole transaction, so
//! transactions are serializable and rollback is simply dropping the
//! clone.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use flowdeck_core::{FlowdeckError, FlowdeckResult};
use flowdeck_domain::{
    Board, BoardId, Card, CardChanges, CardId, EventId, List, ListId, OutboxEvent, StuckCardReport,
};
use tokio::sync::Mutex;

use crate::traits::{BoardStore, MutationContext, TxFuture};

#[derive(Debug, Clone, Default)]
struct StoreState {
    boards: HashMap<BoardId, Board>,
    lists: HashMap<ListId, List>,
    cards: HashMap<CardId, Card>,
    stuck_reports: HashMap<BoardId, StuckCardReport>,
    outbox: Vec<OutboxEvent>,
    consumed: HashSet<EventId>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of outbox events ever appended, consumed or not.
    pub async fn outbox_len(&self) -> usize {
        self.state.lock().await.outbox.len()
    }
}

/// Working copy of the store for one transaction.
struct MemoryTx {
    state: StoreState,
}

#[async_trait]
impl MutationContext for MemoryTx {
    async fn create_board(&mut self, board: Board) -> FlowdeckResult<()> {
        self.state.boards.insert(board.id, board);
        Ok(())
    }

    async fn create_list(&mut self, list: List) -> FlowdeckResult<()> {
        self.state.lists.insert(list.id, list);
        Ok(())
    }

    async fn create_card(&mut self, card: Card) -> FlowdeckResult<()> {
        self.state.cards.insert(card.id, card);
        Ok(())
    }

    async fn update_card(
        &mut self,
        card_id: CardId,
        changes: CardChanges,
        expected_version: u64,
    ) -> FlowdeckResult<Card> {
        let card = self
            .state
            .cards
            .get_mut(&card_id)
            .ok_or_else(|| FlowdeckError::not_found("card", card_id))?;
        if card.version != expected_version {
            return Err(FlowdeckError::version_conflict(
                "card",
                card_id,
                expected_version,
                card.version,
            ));
        }
        card.apply(changes);
        Ok(card.clone())
    }

    async fn move_card(
        &mut self,
        card_id: CardId,
        to_list_id: ListId,
        position: f64,
        expected_version: u64,
    ) -> FlowdeckResult<Card> {
        let card = self
            .state
            .cards
            .get_mut(&card_id)
            .ok_or_else(|| FlowdeckError::not_found("card", card_id))?;
        if card.version != expected_version {
            return Err(FlowdeckError::version_conflict(
                "card",
                card_id,
                expected_version,
                card.version,
            ));
        }
        card.relocate(to_list_id, position);
        Ok(card.clone())
    }

    async fn upsert_stuck_report(&mut self, report: StuckCardReport) -> FlowdeckResult<()> {
        self.state.stuck_reports.insert(report.board_id, report);
        Ok(())
    }

    async fn append_outbox(&mut self, event: OutboxEvent) -> FlowdeckResult<()> {
        self.state.outbox.push(event);
        Ok(())
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn find_board_by_id(&self, id: BoardId) -> FlowdeckResult<Option<Board>> {
        Ok(self.state.lock().await.boards.get(&id).cloned())
    }

    async fn find_list_by_id(&self, id: ListId) -> FlowdeckResult<Option<List>> {
        Ok(self.state.lock().await.lists.get(&id).cloned())
    }

    async fn find_card_by_id(&self, id: CardId) -> FlowdeckResult<Option<Card>> {
        Ok(self.state.lock().await.cards.get(&id).cloned())
    }

    async fn find_lists_by_board(&self, board_id: BoardId) -> FlowdeckResult<Vec<List>> {
        let state = self.state.lock().await;
        let mut lists: Vec<List> = state
            .lists
            .values()
            .filter(|l| l.board_id == board_id)
            .cloned()
            .collect();
        lists.sort_by(|a, b| a.position.total_cmp(&b.position));
        Ok(lists)
    }

    async fn find_cards_by_board(&self, board_id: BoardId) -> FlowdeckResult<Vec<Card>> {
        let state = self.state.lock().await;
        let mut cards: Vec<Card> = state
            .cards
            .values()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        cards.sort_by(|a, b| {
            a.list_id
                .cmp(&b.list_id)
                .then(a.position.total_cmp(&b.position))
        });
        Ok(cards)
    }

    async fn find_stuck_report_by_board_id(
        &self,
        board_id: BoardId,
    ) -> FlowdeckResult<Option<StuckCardReport>> {
        Ok(self.state.lock().await.stuck_reports.get(&board_id).cloned())
    }

    async fn list_unconsumed_outbox(&self, limit: usize) -> FlowdeckResult<Vec<OutboxEvent>> {
        let state = self.state.lock().await;
        Ok(state
            .outbox
            .iter()
            .filter(|e| !state.consumed.contains(&e.id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_outbox_consumed(&self, id: EventId) -> FlowdeckResult<()> {
        self.state.lock().await.consumed.insert(id);
        Ok(())
    }

    async fn run_in_transaction<T, F>(&self, work: F) -> FlowdeckResult<T>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&'c mut dyn MutationContext) -> TxFuture<'c, T> + Send + 'static,
    {
        let mut guard = self.state.lock().await;
        let mut tx = MemoryTx {
            state: guard.clone(),
        };
        let out = work(&mut tx).await?;
        *guard = tx.state;
        tracing::debug!("transaction committed");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_domain::{EventType, Patch};
    use serde_json::json;
    use uuid::Uuid;

    fn board() -> Board {
        Board::new(Uuid::new_v4(), "Sprint board".to_string())
    }

    fn card_in(board: &Board) -> Card {
        Card::new(
            board.org_id,
            board.id,
            Uuid::new_v4(),
            "Fix flaky test".to_string(),
            1024.0,
        )
    }

    fn created_event(board: &Board) -> OutboxEvent {
        OutboxEvent::new(
            EventType::BoardCreated,
            board.org_id,
            board.id,
            json!({ "boardId": board.id }),
        )
    }

    #[tokio::test]
    async fn test_commit_makes_mutation_and_event_visible() {
        let store = MemoryStore::new();
        let board = board();
        let event = created_event(&board);
        let board_id = board.id;

        store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    tx.create_board(board).await?;
                    tx.append_outbox(event).await?;
                    Ok(())
                })
            })
            .await
            .unwrap();

        assert!(store.find_board_by_id(board_id).await.unwrap().is_some());
        assert_eq!(store.list_unconsumed_outbox(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_error_rolls_back_mutation_and_outbox_together() {
        let store = MemoryStore::new();
        let board = board();
        let event = created_event(&board);
        let board_id = board.id;

        let result: FlowdeckResult<()> = store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    tx.create_board(board).await?;
                    tx.append_outbox(event).await?;
                    Err(FlowdeckError::Internal("boom".to_string()))
                })
            })
            .await;

        assert!(result.is_err());
        // State before equals state after: no board, no orphan event.
        assert!(store.find_board_by_id(board_id).await.unwrap().is_none());
        assert!(store.list_unconsumed_outbox(10).await.unwrap().is_empty());
        assert_eq!(store.outbox_len().await, 0);
    }

    #[tokio::test]
    async fn test_update_card_with_matching_version_bumps_by_one() {
        let store = MemoryStore::new();
        let board = board();
        let card = card_in(&board);
        let card_id = card.id;

        store
            .run_in_transaction(move |tx| Box::pin(async move { tx.create_card(card).await }))
            .await
            .unwrap();

        let updated = store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    tx.update_card(
                        card_id,
                        CardChanges {
                            title: Some("Fix flaky test on CI".to_string()),
                            description: Patch::Keep,
                        },
                        0,
                    )
                    .await
                })
            })
            .await
            .unwrap();

        assert_eq!(updated.version, 1);
        let persisted = store.find_card_by_id(card_id).await.unwrap().unwrap();
        assert_eq!(persisted.version, 1);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts_and_leaves_card_unchanged() {
        let store = MemoryStore::new();
        let board = board();
        let card = card_in(&board);
        let card_id = card.id;
        let original_title = card.title.clone();

        store
            .run_in_transaction(move |tx| Box::pin(async move { tx.create_card(card).await }))
            .await
            .unwrap();

        let result = store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    tx.update_card(
                        card_id,
                        CardChanges {
                            title: Some("stale edit".to_string()),
                            description: Patch::Keep,
                        },
                        7,
                    )
                    .await
                })
            })
            .await;

        assert!(matches!(result, Err(FlowdeckError::Conflict(_))));
        let persisted = store.find_card_by_id(card_id).await.unwrap().unwrap();
        assert_eq!(persisted.title, original_title);
        assert_eq!(persisted.version, 0);
    }

    #[tokio::test]
    async fn test_move_card_persists_position_verbatim() {
        let store = MemoryStore::new();
        let board = board();
        let card = card_in(&board);
        let card_id = card.id;
        let target_list = Uuid::new_v4();

        store
            .run_in_transaction(move |tx| Box::pin(async move { tx.create_card(card).await }))
            .await
            .unwrap();

        let moved = store
            .run_in_transaction(move |tx| {
                Box::pin(async move { tx.move_card(card_id, target_list, 1536.0, 0).await })
            })
            .await
            .unwrap();

        assert_eq!(moved.list_id, target_list);
        assert_eq!(moved.position, 1536.0);
        assert_eq!(moved.version, 1);
    }

    #[tokio::test]
    async fn test_consumed_events_are_not_redelivered() {
        let store = MemoryStore::new();
        let board = board();
        let event = created_event(&board);
        let event_id = event.id;

        store
            .run_in_transaction(move |tx| Box::pin(async move { tx.append_outbox(event).await }))
            .await
            .unwrap();

        store.mark_outbox_consumed(event_id).await.unwrap();
        assert!(store.list_unconsumed_outbox(10).await.unwrap().is_empty());
        // The event itself is retained.
        assert_eq!(store.outbox_len().await, 1);
    }

    #[tokio::test]
    async fn test_find_cards_by_board_sorted_by_position() {
        let store = MemoryStore::new();
        let board = board();
        let board_id = board.id;
        let list = Uuid::new_v4();
        let first = Card::new(board.org_id, board.id, list, "a".to_string(), 2048.0);
        let second = Card::new(board.org_id, board.id, list, "b".to_string(), 1024.0);

        store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    tx.create_card(first).await?;
                    tx.create_card(second).await?;
                    Ok(())
                })
            })
            .await
            .unwrap();

        let cards = store.find_cards_by_board(board_id).await.unwrap();
        assert_eq!(cards.len(), 2);
        assert!(cards[0].position < cards[1].position);
    }
}
