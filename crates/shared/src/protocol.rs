use serde::{Deserialize, Serialize};

use crate::domain::ItemId;

/// Payload of the item creation / edit forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemForm {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Neighbor ids computed by the drag-and-drop wiring after a drop.
///
/// `prev`/`next` are absent when the dragged item landed at the front or the
/// back of the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOrder {
    #[serde(default)]
    pub prev: Option<ItemId>,
    pub curr: ItemId,
    #[serde(default)]
    pub next: Option<ItemId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_order_accepts_missing_neighbors() {
        let order: ItemOrder =
            serde_urlencoded_like("curr=i-5").expect("front-of-list drop parses");
        assert_eq!(order.prev, None);
        assert_eq!(order.curr, ItemId(5));
        assert_eq!(order.next, None);
    }

    #[test]
    fn item_order_parses_full_neighborhood() {
        let order: ItemOrder =
            serde_urlencoded_like("prev=i-1&curr=i-2&next=i-3").expect("parses");
        assert_eq!(order.prev, Some(ItemId(1)));
        assert_eq!(order.curr, ItemId(2));
        assert_eq!(order.next, Some(ItemId(3)));
    }

    // The server consumes these as urlencoded forms; going through JSON here
    // exercises the same serde derives without pulling the extractor in.
    fn serde_urlencoded_like(query: &str) -> Result<ItemOrder, serde_json::Error> {
        let mut map = serde_json::Map::new();
        for pair in query.split('&') {
            let (k, v) = pair.split_once('=').expect("k=v");
            map.insert(k.to_owned(), serde_json::Value::String(v.to_owned()));
        }
        serde_json::from_value(serde_json::Value::Object(map))
    }
}
