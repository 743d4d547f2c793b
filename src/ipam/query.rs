//! SWQL query text and the page loop.

use crate::error::Result;
use crate::models::{RecordId, Row, REQUIRED_COLUMNS};
use itertools::Itertools;

/// Query for every Group/Supernet/Subnet row, ordered by address.
///
/// The columns the hierarchy needs are always selected.
pub fn group_query(columns: &[String]) -> String {
    let columns = REQUIRED_COLUMNS
        .iter()
        .copied()
        .chain(columns.iter().map(String::as_str))
        .unique()
        .join(", ");
    format!("SELECT DISTINCT {columns} FROM IPAM.Subnet ORDER BY Address")
}

/// Query for the live IP nodes of one subnet, ordered numerically.
///
/// Status 2 marks a node as available (not in use); those are left out.
pub fn host_query(columns: &[String], extra: &[String], subnet_id: RecordId) -> String {
    let columns = columns.iter().chain(extra.iter()).unique().join(", ");
    format!(
        "SELECT {columns} FROM IPAM.IPNode WHERE SubnetId={subnet_id} AND Status<>2 ORDER BY IPAddressN"
    )
}

/// Restrict a query to rows `from..=to` (1-based).
pub fn paged(query: &str, from: usize, to: usize) -> String {
    format!("{query} WITH ROWS {from} TO {to}")
}

/// Fetch all rows page by page.
///
/// `fetch` is called with 1-based inclusive row bounds. A page that is not
/// exactly `per_page` long ends the loop.
pub fn fetch_pages<F>(per_page: usize, what: &str, mut fetch: F) -> Result<Vec<Row>>
where
    F: FnMut(usize, usize) -> Result<Vec<Row>>,
{
    let mut rows = Vec::new();
    let mut from = 1;
    let mut block = 0;

    loop {
        let to = from + per_page - 1;
        let page = fetch(from, to)?;
        let count = page.len();
        rows.extend(page);

        log::debug!(
            "got {what} block#{block:2} record_count=+{count:3} => {total:3}",
            total = rows.len()
        );
        block += 1;

        if count != per_page {
            break;
        }
        from += count;
    }

    log::info!("Got {} {what} rows in {block} blocks", rows.len());
    Ok(rows)
}
