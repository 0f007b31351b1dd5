//! Shared BSON filter-document builders. UUIDs and timestamps are stored in
//! their canonical string forms, so filters compare against those.

use bson::{doc, Document};
use uuid::Uuid;

#[inline]
pub fn by_id(id: Uuid) -> Document {
    doc! { "_id": id.to_string() }
}

#[inline]
pub fn by_ref(field: &str, id: Uuid) -> Document {
    let mut filter = Document::new();
    filter.insert(field, id.to_string());
    filter
}

/// Escapes regex metacharacters so user search terms match literally.
pub fn regex_escape(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if "\\.+*?()|[]{}^$".contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Case-insensitive substring match over any of the given fields.
pub fn ci_contains(fields: &[&str], term: &str) -> Document {
    let pattern = regex_escape(term);
    let clauses: Vec<Document> = fields
        .iter()
        .map(|f| {
            let mut clause = Document::new();
            clause.insert(*f, doc! { "$regex": &pattern, "$options": "i" });
            clause
        })
        .collect();
    doc! { "$or": clauses }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_id_uses_canonical_uuid_string() {
        let id = Uuid::new_v4();
        let filter = by_id(id);
        assert_eq!(filter.get_str("_id").unwrap(), id.to_string());
    }

    #[test]
    fn search_terms_are_escaped_and_case_insensitive() {
        let filter = ci_contains(&["title", "description"], "c++ (advanced)");
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);

        let title = clauses[0].as_document().unwrap().get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), "c\\+\\+ \\(advanced\\)");
        assert_eq!(title.get_str("$options").unwrap(), "i");
    }
}
