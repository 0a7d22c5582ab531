//! Ticket list queries
//!
//! Translates raw list parameters into an equality filter, an optional sort
//! and an optional page window.

use serde::Serialize;
use std::cmp::Ordering;

use crate::application::dto::ListTicketsParams;
use crate::domain::aggregates::Ticket;
use crate::domain::value_objects::RecordId;

/// Equality constraints, combined with AND
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<String>,
    pub assigned_to: Option<RecordId>,
    pub severity: Option<String>,
    pub kind: Option<String>,
}

impl TicketFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assigned_to.is_none() && self.severity.is_none() && self.kind.is_none()
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        let status = ticket.status.map(|status| status.as_str());

        self.status.as_deref().map_or(true, |want| status == Some(want))
            && self.assigned_to.map_or(true, |want| ticket.assigned_to == Some(want))
            && self.severity.as_deref().map_or(true, |want| ticket.severity == want)
            && self.kind.as_deref().map_or(true, |want| ticket.kind == want)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// `desc` sorts descending, anything else ascending
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("desc") => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }

    pub fn direction(&self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketSort {
    /// Field name as it appears on the wire
    pub field: String,
    pub order: SortOrder,
}

impl TicketSort {
    /// Compare two tickets on the sort field. Unknown fields compare equal.
    pub fn compare(&self, a: &Ticket, b: &Ticket) -> Ordering {
        let ordering = match self.field.as_str() {
            "_id" | "id" => a.id.cmp(&b.id),
            "topic" => a.topic.cmp(&b.topic),
            "description" => a.description.cmp(&b.description),
            "dateCreated" => a.date_created.cmp(&b.date_created),
            "severity" => a.severity.cmp(&b.severity),
            "type" => a.kind.cmp(&b.kind),
            "assignedTo" => a.assigned_to.cmp(&b.assigned_to),
            "status" => a.status.map(|s| s.as_str()).cmp(&b.status.map(|s| s.as_str())),
            "resolvedOn" => a.resolved_on.cmp(&b.resolved_on),
            _ => Ordering::Equal,
        };

        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// Page window, `skip = (page - 1) * limit`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TicketQuery {
    pub filter: TicketFilter,
    pub sort: Option<TicketSort>,
    pub pagination: Option<Pagination>,
}

impl TicketQuery {
    pub fn parse(params: &ListTicketsParams) -> Result<Self, CastError> {
        let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        let assigned_to = match present(&params.assigned_to) {
            Some(raw) => Some(RecordId::parse(&raw).ok_or_else(|| CastError::new("ObjectId", "assignedTo", raw))?),
            None => None,
        };

        let filter = TicketFilter {
            status: present(&params.status),
            assigned_to,
            severity: present(&params.severity),
            kind: present(&params.kind),
        };

        let sort = present(&params.sort_by).map(|field| TicketSort {
            field,
            order: SortOrder::parse(params.sort_order.as_deref()),
        });

        let page = parse_count("page", present(&params.page))?;
        let limit = parse_count("limit", present(&params.limit))?;

        if page == Some(0) {
            return Err(CastError::new("number", "page", "0".to_string()));
        }

        let pagination = match limit {
            Some(limit) if limit > 0 => Some(Pagination { page: page.unwrap_or(1), limit }),
            _ => None,
        };

        Ok(Self { filter, sort, pagination })
    }

    /// Apply sort and page window to an already filtered, insertion ordered set
    pub fn arrange(&self, mut tickets: Vec<Ticket>) -> Vec<Ticket> {
        if let Some(sort) = &self.sort {
            tickets.sort_by(|a, b| sort.compare(a, b));
        }

        match self.pagination {
            Some(window) => tickets
                .into_iter()
                .skip(usize::try_from(window.skip()).unwrap_or(usize::MAX))
                .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
                .collect(),
            None => tickets,
        }
    }
}

fn parse_count(path: &'static str, raw: Option<String>) -> Result<Option<u64>, CastError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| CastError::new("number", path, raw)),
        None => Ok(None),
    }
}

/// A query value that could not be cast to its field type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct CastError {
    pub name: &'static str,
    pub kind: &'static str,
    pub path: &'static str,
    pub value: String,
    pub message: String,
}

impl CastError {
    pub fn new(kind: &'static str, path: &'static str, value: String) -> Self {
        Self {
            name: "CastError",
            kind,
            path,
            message: format!(
                "Cast to {kind} failed for value \"{value}\" (type string) at path \"{path}\" for model \"SupportTicket\""
            ),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> ListTicketsParams {
        let map: serde_json::Map<String, serde_json::Value> =
            pairs.iter().map(|(k, v)| (k.to_string(), json!(v))).collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    fn ticket(topic: &str, severity: &str, status: Option<&str>) -> Ticket {
        let mut body = json!({
            "topic": topic,
            "description": "d",
            "severity": severity,
            "type": "Bug",
        });
        if let Some(status) = status {
            body["status"] = json!(status);
        }
        Ticket::from_body(&body).unwrap()
    }

    #[test]
    fn test_empty_params() {
        let query = TicketQuery::parse(&ListTicketsParams::default()).unwrap();
        assert!(query.filter.is_empty());
        assert!(query.sort.is_none());
        assert!(query.pagination.is_none());
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let query = TicketQuery::parse(&params(&[("status", ""), ("assignedTo", "")])).unwrap();
        assert!(query.filter.is_empty());
    }

    #[test]
    fn test_filter_and_semantics() {
        let query = TicketQuery::parse(&params(&[("status", "New"), ("severity", "High")])).unwrap();

        assert!(query.filter.matches(&ticket("a", "High", Some("New"))));
        assert!(!query.filter.matches(&ticket("b", "Low", Some("New"))));
        assert!(!query.filter.matches(&ticket("c", "High", None)));
    }

    #[test]
    fn test_bad_assigned_to() {
        let err = TicketQuery::parse(&params(&[("assignedTo", "xyz")])).unwrap_err();
        assert_eq!(err.kind, "ObjectId");
        assert_eq!(err.path, "assignedTo");
        assert_eq!(err.value, "xyz");
    }

    #[test]
    fn test_pagination_window() {
        let query = TicketQuery::parse(&params(&[("page", "3"), ("limit", "10")])).unwrap();
        assert_eq!(query.pagination.unwrap().skip(), 20);

        let query = TicketQuery::parse(&params(&[("limit", "5")])).unwrap();
        assert_eq!(query.pagination, Some(Pagination { page: 1, limit: 5 }));

        let query = TicketQuery::parse(&params(&[("page", "2")])).unwrap();
        assert!(query.pagination.is_none());
    }

    #[test]
    fn test_bad_pagination() {
        assert_eq!(TicketQuery::parse(&params(&[("limit", "ten")])).unwrap_err().path, "limit");
        assert_eq!(TicketQuery::parse(&params(&[("page", "-1")])).unwrap_err().path, "page");
        assert_eq!(TicketQuery::parse(&params(&[("page", "0"), ("limit", "2")])).unwrap_err().path, "page");
    }

    #[test]
    fn test_sort_order() {
        let query = TicketQuery::parse(&params(&[("sortBy", "topic"), ("sortOrder", "desc")])).unwrap();
        let sort = query.sort.clone().unwrap();
        assert_eq!(sort.order, SortOrder::Descending);

        let arranged = query.arrange(vec![ticket("a", "x", None), ticket("c", "x", None), ticket("b", "x", None)]);
        let topics: Vec<_> = arranged.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(topics, ["c", "b", "a"]);

        let query = TicketQuery::parse(&params(&[("sortBy", "topic"), ("sortOrder", "sideways")])).unwrap();
        assert_eq!(query.sort.unwrap().order, SortOrder::Ascending);
    }

    #[test]
    fn test_arrange_pages_after_sort() {
        let query = TicketQuery::parse(&params(&[("sortBy", "topic"), ("page", "2"), ("limit", "2")])).unwrap();
        let arranged = query.arrange(vec![
            ticket("d", "x", None),
            ticket("a", "x", None),
            ticket("c", "x", None),
            ticket("b", "x", None),
            ticket("e", "x", None),
        ]);
        let topics: Vec<_> = arranged.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(topics, ["c", "d"]);
    }

    #[test]
    fn test_unknown_sort_field_keeps_order() {
        let query = TicketQuery::parse(&params(&[("sortBy", "priority")])).unwrap();
        let arranged = query.arrange(vec![ticket("b", "x", None), ticket("a", "x", None)]);
        let topics: Vec<_> = arranged.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(topics, ["b", "a"]);
    }
}
