use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use tastebud_core::domain::conversation::{Conversation, ConversationId};
use tastebud_core::domain::interaction::{FeedbackKind, InteractionLog, RecommendationEvent};
use tastebud_core::domain::product::{Product, ProductId};

use super::{
    ConversationRepository, ProductCatalog, RecommendationEventRepository, RepositoryError,
};

#[derive(Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<BTreeMap<String, Product>>,
}

impl InMemoryProductCatalog {
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: RwLock::new(
                products.into_iter().map(|product| (product.id.0.clone(), product)).collect(),
            ),
        }
    }
}

#[async_trait::async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        product.validate()?;
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: RwLock<HashMap<String, Conversation>>,
    logs: RwLock<Vec<InteractionLog>>,
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversations = self.conversations.read().await;
        Ok(conversations.get(&id.0).cloned())
    }

    async fn save(&self, conversation: Conversation) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.write().await;
        conversations.insert(conversation.id.0.clone(), conversation);
        Ok(())
    }

    async fn save_turn(
        &self,
        conversation: Conversation,
        log: InteractionLog,
    ) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.write().await;
        let mut logs = self.logs.write().await;
        conversations.insert(conversation.id.0.clone(), conversation);
        logs.push(log);
        Ok(())
    }

    async fn list_interactions(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<InteractionLog>, RepositoryError> {
        let logs = self.logs.read().await;
        Ok(logs.iter().filter(|log| &log.conversation_id == conversation_id).cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<Conversation>, RepositoryError> {
        let conversations = self.conversations.read().await;
        let mut all: Vec<Conversation> = conversations.values().cloned().collect();
        all.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(all)
    }

    async fn list_all_interactions(&self) -> Result<Vec<InteractionLog>, RepositoryError> {
        Ok(self.logs.read().await.clone())
    }
}

#[derive(Default)]
pub struct InMemoryRecommendationEventRepository {
    events: RwLock<Vec<RecommendationEvent>>,
}

#[async_trait::async_trait]
impl RecommendationEventRepository for InMemoryRecommendationEventRepository {
    async fn append_if_absent(
        &self,
        incoming: Vec<RecommendationEvent>,
    ) -> Result<usize, RepositoryError> {
        let mut events = self.events.write().await;
        let mut inserted = 0;
        for event in incoming {
            if events.iter().any(|existing| existing.key() == event.key()) {
                continue;
            }
            events.push(event);
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn record_feedback(
        &self,
        conversation_id: &ConversationId,
        product_id: &ProductId,
        kind: FeedbackKind,
    ) -> Result<bool, RepositoryError> {
        let mut events = self.events.write().await;
        let Some(event) = events.iter_mut().find(|event| {
            &event.conversation_id == conversation_id && &event.product_id == product_id
        }) else {
            return Ok(false);
        };

        event.clicked = true;
        if kind == FeedbackKind::Ordered {
            event.ordered = true;
        }
        Ok(true)
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<RecommendationEvent>, RepositoryError> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|event| &event.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<RecommendationEvent>, RepositoryError> {
        Ok(self.events.read().await.clone())
    }
}
