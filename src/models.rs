//! Resource Models
//! Mission: Typed request and response bodies for every collection route

use crate::store::{Document, Filter, FindQuery, Sort, SortOrder, ID_FIELD};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request bodies that end up stored as a document.
///
/// Client-supplied `_id` values are always dropped; the store assigns ids.
pub trait IntoDocument {
    fn into_document(self) -> Document;
}

fn keyed(mut rest: Document, key: &str, value: String) -> Document {
    rest.remove(ID_FIELD);
    rest.insert(key.to_string(), Value::String(value));
    rest
}

// ===== Users =====

/// Registration body for `POST /users`
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    #[serde(flatten)]
    pub profile: Document,
}

impl IntoDocument for NewUser {
    /// Roles are only granted through the promotion routes, never at sign-up
    fn into_document(self) -> Document {
        let mut profile = self.profile;
        profile.remove("role");
        keyed(profile, "email", self.email)
    }
}

/// Soft failure of `POST /users`: answered with 200 and a null id
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlreadyExists {
    pub message: &'static str,
    pub inserted_id: Option<String>,
}

impl AlreadyExists {
    pub fn user() -> Self {
        Self {
            message: "user already exists",
            inserted_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub admin: bool,
}

#[derive(Debug, Serialize)]
pub struct AgentStatus {
    pub agent: bool,
}

// ===== Properties =====

#[derive(Debug, Deserialize)]
pub struct NewProperty {
    pub title: String,
    #[serde(flatten)]
    pub details: Document,
}

impl IntoDocument for NewProperty {
    fn into_document(self) -> Document {
        keyed(self.details, "title", self.title)
    }
}

/// Query string of `GET /properties`
#[derive(Debug, Default, Deserialize)]
pub struct PropertyQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
    /// `asc` for cheapest first; any other value sorts by descending price
    pub sort: Option<String>,
}

impl PropertyQuery {
    fn is_empty(&self) -> bool {
        self.search.is_none() && self.page.is_none() && self.size.is_none() && self.sort.is_none()
    }

    /// No parameters means the plain listing in natural order; otherwise a
    /// title search sorted by price, `size` per page.
    pub fn to_find_query(&self) -> FindQuery {
        if self.is_empty() {
            return FindQuery::all();
        }

        let filter = match &self.search {
            Some(needle) => Filter::Contains {
                field: "title",
                needle: needle.clone(),
            },
            None => Filter::All,
        };
        let order = match self.sort.as_deref() {
            Some("asc") => SortOrder::Ascending,
            _ => SortOrder::Descending,
        };

        FindQuery {
            filter,
            sort: Some(Sort {
                field: "price",
                order,
            }),
            skip: match self.size {
                Some(size) => self.page.unwrap_or(0).saturating_mul(size),
                None => 0,
            },
            // size=0 means no limit, as the document database reads it
            limit: self.size.filter(|&size| size > 0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

// ===== Reviews =====

/// Reviews are stored exactly as posted
#[derive(Debug, Deserialize)]
pub struct NewReview {
    #[serde(flatten)]
    pub body: Document,
}

impl IntoDocument for NewReview {
    fn into_document(self) -> Document {
        let mut body = self.body;
        body.remove(ID_FIELD);
        body
    }
}

// ===== Wishlist =====

#[derive(Debug, Deserialize)]
pub struct NewWishListItem {
    pub email: String,
    #[serde(flatten)]
    pub item: Document,
}

impl IntoDocument for NewWishListItem {
    fn into_document(self) -> Document {
        keyed(self.item, "email", self.email)
    }
}

/// `?email=` filter shared by the per-user collections
#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

impl EmailQuery {
    /// A missing email matches only documents that have none
    pub fn to_filter(&self) -> Filter {
        Filter::FieldEq {
            field: "email",
            value: self.email.clone(),
        }
    }
}

// ===== Agent-added items =====

#[derive(Debug, Deserialize)]
pub struct NewAgentItem {
    pub email: String,
    #[serde(flatten)]
    pub item: Document,
}

impl IntoDocument for NewAgentItem {
    fn into_document(self) -> Document {
        keyed(self.item, "email", self.email)
    }
}

/// Body of `PATCH /myAdded/:id`. Exactly these attributes are written;
/// any left out of the body are set to null.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AgentItemUpdate {
    pub name: Option<Value>,
    pub category: Option<Value>,
    pub email: Option<Value>,
    pub price: Option<Value>,
    pub origin: Option<Value>,
    pub quantity: Option<Value>,
    pub image: Option<Value>,
}

impl AgentItemUpdate {
    pub fn into_set(self) -> Document {
        [
            ("name", self.name),
            ("category", self.category),
            ("email", self.email),
            ("price", self.price),
            ("origin", self.origin),
            ("quantity", self.quantity),
            ("image", self.image),
        ]
        .into_iter()
        .map(|(field, value)| (field.to_string(), value.unwrap_or(Value::Null)))
        .collect()
    }
}
