use async_trait::async_trait;
use flowdeck_core::FlowdeckResult;
use flowdeck_domain::{
    Board, BoardId, Card, CardChanges, CardId, EventId, List, ListId, OutboxEvent, StuckCardReport,
};
use futures::future::BoxFuture;

/// Future returned by transactional work; borrows the mutation context for
/// the duration of the transaction.
pub type TxFuture<'a, T> = BoxFuture<'a, FlowdeckResult<T>>;

/// Mutation operations available inside one transaction.
///
/// Everything done through one context commits or rolls back together: an
/// async consumer must never observe an outbox event for a mutation that
/// rolled back, and a committed mutation must never lack its event.
///
/// `update_card` and `move_card` compare the persisted version against
/// `expected_version` as part of the same transaction; a mismatch aborts
/// with `Conflict` and leaves no partial update visible.
#[async_trait]
pub trait MutationContext: Send {
    async fn create_board(&mut self, board: Board) -> FlowdeckResult<()>;

    async fn create_list(&mut self, list: List) -> FlowdeckResult<()>;

    async fn create_card(&mut self, card: Card) -> FlowdeckResult<()>;

    /// Version-checked content update. Returns the card as persisted, with
    /// its version bumped by exactly 1.
    async fn update_card(
        &mut self,
        card_id: CardId,
        changes: CardChanges,
        expected_version: u64,
    ) -> FlowdeckResult<Card>;

    /// Version-checked move. The position is persisted verbatim along with
    /// the new list id.
    async fn move_card(
        &mut self,
        card_id: CardId,
        to_list_id: ListId,
        position: f64,
        expected_version: u64,
    ) -> FlowdeckResult<Card>;

    async fn upsert_stuck_report(&mut self, report: StuckCardReport) -> FlowdeckResult<()>;

    async fn append_outbox(&mut self, event: OutboxEvent) -> FlowdeckResult<()>;
}

/// The seam the use-case layer depends on, independent of storage
/// technology.
///
/// Read operations report absence as `Ok(None)`, never as an error.
/// Adapters map their own faults into the core taxonomy; a policy denial
/// at the storage layer surfaces as `Forbidden`, anything else unexpected
/// as `Internal`.
#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn find_board_by_id(&self, id: BoardId) -> FlowdeckResult<Option<Board>>;

    async fn find_list_by_id(&self, id: ListId) -> FlowdeckResult<Option<List>>;

    async fn find_card_by_id(&self, id: CardId) -> FlowdeckResult<Option<Card>>;

    /// Lists for one board, sorted ascending by position.
    async fn find_lists_by_board(&self, board_id: BoardId) -> FlowdeckResult<Vec<List>>;

    /// Cards for one board, sorted ascending by position within each list.
    async fn find_cards_by_board(&self, board_id: BoardId) -> FlowdeckResult<Vec<Card>>;

    async fn find_stuck_report_by_board_id(
        &self,
        board_id: BoardId,
    ) -> FlowdeckResult<Option<StuckCardReport>>;

    /// Unacknowledged outbox events in append order, oldest first.
    async fn list_unconsumed_outbox(&self, limit: usize) -> FlowdeckResult<Vec<OutboxEvent>>;

    /// Acknowledge an event so it is not redelivered. Events themselves
    /// are never deleted.
    async fn mark_outbox_consumed(&self, id: EventId) -> FlowdeckResult<()>;

    /// Run `work` inside one transaction.
    ///
    /// Commits on `Ok`, rolls back every mutation and outbox append on
    /// `Err`. The error is returned unchanged.
    async fn run_in_transaction<T, F>(&self, work: F) -> FlowdeckResult<T>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&'c mut dyn MutationContext) -> TxFuture<'c, T> + Send + 'static;
}
