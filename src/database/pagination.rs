use serde::{Deserialize, Serialize};

/// Offset-based page wrapper returned by every paged fetch.
#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: i64,
    pub prev_offset: i64,
    pub page_list: Vec<(String, i64)>,
    pub message: Option<String>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }
        let last_offset = ((total_rows - 1).max(0) / page_size) * page_size;
        let next_offset = (current_offset + page_size).min(last_offset);
        let prev_offset = (current_offset - page_size).max(0);

        let page_count = (total_rows as f64 / page_size as f64).ceil() as usize;
        let current_page = (current_offset / page_size) as usize;

        let page_list = (0..page_count)
            .map(|n| {
                let label = if n == current_page {
                    String::from("...")
                } else {
                    format!("{}", n + 1)
                };
                let offset = ((n as i64) * page_size).min(last_offset);

                (label, offset)
            })
            .collect();

        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
            page_list,
            message: Some(format!(
                "{} - {} / {}",
                current_offset,
                (current_offset + page_size).min(total_rows),
                total_rows
            )),
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: 0,
            prev_offset: 0,
            page_list: vec![(String::from("1"), 0)],
            message: Some(String::from("No results")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page() {
        let page = PageContext::<i32>::from_rows(vec![], 0, 10, 0);
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.page_list, vec![(String::from("1"), 0)]);
    }

    #[test]
    fn first_page_of_three() {
        let page = PageContext::from_rows(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10], 25, 10, 0);
        assert_eq!(page.prev_offset, 0);
        assert_eq!(page.next_offset, 10);
        assert_eq!(page.page_list.len(), 3);
        // current page is masked in the page list
        assert_eq!(page.page_list[0].0, "...");
        assert_eq!(page.page_list[1], (String::from("2"), 10));
    }

    #[test]
    fn full_last_page_does_not_overrun() {
        // 20 rows split into exactly two full pages; from the second page
        // there is nowhere further to go.
        let page = PageContext::from_rows(vec![11, 12, 13, 14, 15, 16, 17, 18, 19, 20], 20, 10, 10);
        assert_eq!(page.next_offset, 10);
        assert_eq!(page.prev_offset, 0);
        assert_eq!(page.page_list.len(), 2);
        assert_eq!(page.message.as_deref(), Some("10 - 20 / 20"));
    }

    #[test]
    fn last_page_does_not_overrun() {
        let page = PageContext::from_rows(vec![1, 2, 3, 4, 5], 25, 10, 20);
        assert_eq!(page.next_offset, 20);
        assert_eq!(page.prev_offset, 10);
        assert_eq!(page.message.as_deref(), Some("20 - 25 / 25"));
    }
}
