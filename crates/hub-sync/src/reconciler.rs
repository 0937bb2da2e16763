//! Turns added records into "who changed what" notification text.
//!
//! Records of different streams name their author and their headline in
//! different fields. Both are found by walking an ordered field list and
//! taking the first non-empty string.

use hub_storage::{ChangeBatch, Collection, Document};

/// Fields naming a record's author, in lookup order.
pub const ACTOR_FIELDS: [&str; 4] = ["createdBy", "author", "senderName", "userName"];

/// Fields holding a record's headline, in lookup order.
pub const FRAGMENT_FIELDS: [&str; 4] = ["text", "name", "topic", "description"];

fn first_field<'a>(doc: &'a Document, fields: &[&str]) -> Option<&'a str> {
    fields.iter().find_map(|field| doc.str_field(field))
}

/// Author label of a record, if one of the lookup fields is present.
pub fn actor_label(doc: &Document) -> Option<&str> {
    first_field(doc, &ACTOR_FIELDS)
}

/// Headline of a record, if one of the lookup fields is present.
pub fn fragment(doc: &Document) -> Option<&str> {
    first_field(doc, &FRAGMENT_FIELDS)
}

/// Human label used in notifications for a stream. The roster raises none.
pub fn stream_label(collection: Collection) -> Option<&'static str> {
    match collection {
        Collection::Members => None,
        Collection::Goals => Some("goal"),
        Collection::Trips => Some("trip"),
        Collection::Messages => Some("message"),
        Collection::Meetings => Some("meeting"),
        Collection::Wins => Some("win"),
        Collection::Chat => Some("chat message"),
    }
}

/// Notification text for one added record, or `None` when it is suppressed:
/// no author label, or the author is the caller.
pub fn notification_for(label: &str, doc: &Document, self_name: Option<&str>) -> Option<String> {
    let actor = actor_label(doc)?;
    if Some(actor) == self_name {
        return None;
    }
    Some(format!("New {}: \"{}\"", label, fragment(doc).unwrap_or_default()))
}

/// Notification texts raised by a batch delivered after the initial-load
/// window, in change order.
pub fn notifications_for(
    collection: Collection,
    batch: &ChangeBatch,
    self_name: Option<&str>,
) -> Vec<String> {
    let Some(label) = stream_label(collection) else {
        return Vec::new();
    };
    batch
        .added()
        .filter_map(|doc| notification_for(label, doc, self_name))
        .collect()
}
