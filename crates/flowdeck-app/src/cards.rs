use std::sync::Arc;

use flowdeck_core::{FlowdeckError, FlowdeckResult, RequestContext};
use flowdeck_domain::position::position_for_append;
use flowdeck_domain::validate::{MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};
use flowdeck_domain::{
    Card, CardChanges, CardId, EventType, ListId, OutboxEvent, Patch, Violations,
};
use flowdeck_store::BoardStore;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCardInput {
    pub list_id: ListId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ordering key within the list; appended after existing cards when
    /// omitted.
    #[serde(default)]
    pub position: Option<f64>,
}

impl CreateCardInput {
    pub fn validate(&self) -> FlowdeckResult<()> {
        let mut violations = Violations::new();
        violations.require_non_empty("title", &self.title);
        violations.require_max_len("title", &self.title, MAX_TITLE_LEN);
        if let Some(description) = &self.description {
            violations.require_max_len("description", description, MAX_DESCRIPTION_LEN);
        }
        if let Some(position) = self.position {
            violations.require_finite_positive("position", position);
        }
        violations.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCardInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Patch<String>,
    pub expected_version: u64,
}

impl UpdateCardInput {
    pub fn validate(&self) -> FlowdeckResult<()> {
        let mut violations = Violations::new();
        if self.title.is_none() && !self.description.is_change() {
            violations.add("at least one field must change");
        }
        if let Some(title) = &self.title {
            violations.require_non_empty("title", title);
            violations.require_max_len("title", title, MAX_TITLE_LEN);
        }
        if let Some(description) = self.description.as_set() {
            violations.require_max_len("description", description, MAX_DESCRIPTION_LEN);
        }
        violations.into_result()
    }

    fn into_changes(self) -> CardChanges {
        CardChanges {
            title: self.title,
            description: self.description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveCardInput {
    pub to_list_id: ListId,
    /// Computed client-side (see `flowdeck_domain::position`) and
    /// persisted verbatim.
    pub position: f64,
    pub expected_version: u64,
}

impl MoveCardInput {
    pub fn validate(&self) -> FlowdeckResult<()> {
        let mut violations = Violations::new();
        violations.require_finite_positive("position", self.position);
        violations.into_result()
    }
}

/// Card mutation use-cases: create, content update, move.
///
/// Updates and moves are optimistic: the caller claims the version it last
/// read, and the store's compare-and-swap rejects stale claims with a
/// Conflict instead of silently overwriting. Each successful mutation
/// appends exactly one outbox event inside the same transaction.
pub struct CardService<S> {
    store: Arc<S>,
}

impl<S: BoardStore> CardService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create_card(
        &self,
        ctx: &RequestContext,
        input: CreateCardInput,
    ) -> FlowdeckResult<Card> {
        ctx.ensure_can_write()?;
        input.validate()?;

        let list = match self.store.find_list_by_id(input.list_id).await? {
            Some(list) if list.org_id == ctx.org_id => list,
            _ => return Err(FlowdeckError::not_found("list", input.list_id)),
        };

        let position = match input.position {
            Some(position) => position,
            None => {
                let board_cards = self.store.find_cards_by_board(list.board_id).await?;
                let positions: Vec<f64> = board_cards
                    .iter()
                    .filter(|c| c.list_id == list.id)
                    .map(|c| c.position)
                    .collect();
                position_for_append(&positions)
            }
        };

        let mut card = Card::new(ctx.org_id, list.board_id, list.id, input.title, position);
        card.description = input.description;

        let event = OutboxEvent::new(
            EventType::CardCreated,
            ctx.org_id,
            list.board_id,
            json!({
                "cardId": card.id,
                "listId": list.id,
                "boardId": list.board_id,
                "actorId": ctx.user_id,
            }),
        );

        let created = card.clone();
        self.store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    tx.create_card(card).await?;
                    tx.append_outbox(event).await?;
                    Ok(())
                })
            })
            .await?;

        tracing::info!("Created card {} ({})", created.title, created.id);
        Ok(created)
    }

    pub async fn update_card(
        &self,
        ctx: &RequestContext,
        card_id: CardId,
        input: UpdateCardInput,
    ) -> FlowdeckResult<Card> {
        ctx.ensure_can_write()?;
        input.validate()?;

        let card = self.get_card(ctx, card_id).await?;
        let expected_version = input.expected_version;
        let changes = input.into_changes();
        let org_id = ctx.org_id;
        let actor_id = ctx.user_id;
        let board_id = card.board_id;

        let updated = self
            .store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let updated = tx.update_card(card_id, changes, expected_version).await?;
                    let event = OutboxEvent::new(
                        EventType::CardUpdated,
                        org_id,
                        board_id,
                        json!({
                            "cardId": card_id,
                            "boardId": board_id,
                            "version": updated.version,
                            "actorId": actor_id,
                        }),
                    );
                    tx.append_outbox(event).await?;
                    Ok(updated)
                })
            })
            .await?;

        tracing::info!("Updated card {} to version {}", card_id, updated.version);
        Ok(updated)
    }

    pub async fn move_card(
        &self,
        ctx: &RequestContext,
        card_id: CardId,
        input: MoveCardInput,
    ) -> FlowdeckResult<Card> {
        ctx.ensure_can_write()?;
        input.validate()?;

        let card = self.get_card(ctx, card_id).await?;
        let org_id = ctx.org_id;
        let actor_id = ctx.user_id;
        let board_id = card.board_id;
        let to_list_id = input.to_list_id;
        let position = input.position;
        let expected_version = input.expected_version;

        let moved = self
            .store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let moved = tx
                        .move_card(card_id, to_list_id, position, expected_version)
                        .await?;
                    let event = OutboxEvent::new(
                        EventType::CardMoved,
                        org_id,
                        board_id,
                        json!({
                            "cardId": card_id,
                            "toListId": to_list_id,
                            "position": position,
                            "version": moved.version,
                            "actorId": actor_id,
                        }),
                    );
                    tx.append_outbox(event).await?;
                    Ok(moved)
                })
            })
            .await?;

        tracing::info!("Moved card {} to list {}", card_id, to_list_id);
        Ok(moved)
    }

    /// Org-scoped fetch. A card in another org is reported as not found.
    pub async fn get_card(&self, ctx: &RequestContext, id: CardId) -> FlowdeckResult<Card> {
        match self.store.find_card_by_id(id).await? {
            Some(card) if card.org_id == ctx.org_id => Ok(card),
            _ => Err(FlowdeckError::not_found("card", id)),
        }
    }
}
