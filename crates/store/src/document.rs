//! Collections, the `Document` trait and change events.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use bloom_core::chat::{ChatMessage, Feedback};
use bloom_core::customer::Customer;
use bloom_core::order::Order;
use bloom_core::catalog::Product;

/// A named group of documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Products,
    Orders,
    Customers,
    Feedback,
    ChatMessages,
}

impl Collection {
    /// Every collection.
    pub const ALL: [Self; 5] = [
        Self::Products,
        Self::Orders,
        Self::Customers,
        Self::Feedback,
        Self::ChatMessages,
    ];

    /// Name used as the `collection` column and the local file stem.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Customers => "customers",
            Self::Feedback => "feedback",
            Self::ChatMessages => "chat_messages",
        }
    }

    /// Local backend file name.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}

/// A value stored in a collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the document lives in.
    const COLLECTION: Collection;

    /// Stable document id, unique within the collection.
    fn id(&self) -> &str;
}

impl Document for Product {
    const COLLECTION: Collection = Collection::Products;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl Document for Order {
    const COLLECTION: Collection = Collection::Orders;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl Document for Customer {
    const COLLECTION: Collection = Collection::Customers;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl Document for Feedback {
    const COLLECTION: Collection = Collection::Feedback;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl Document for ChatMessage {
    const COLLECTION: Collection = Collection::ChatMessages;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    /// The whole collection was replaced (bulk import or seed).
    Reloaded,
}

/// A change notification, broadcast after each successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    /// Empty for [`ChangeKind::Reloaded`].
    pub id: String,
    pub kind: ChangeKind,
    pub at: DateTime<Utc>,
}
