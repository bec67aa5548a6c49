//! Presentation layer: entity sequences to sortable, pageable tables.
//!
//! Rows always come out in the order the query layer produced them unless the
//! client explicitly asks for a column sort.

pub mod columns;
pub mod html;
pub mod paging;
pub mod table;

pub use columns::{backup_columns, cluster_columns, node_columns};
pub use paging::{Pagination, SortSpec, TableQuery, MAX_PAGE_SIZE};
pub use table::{Cell, Column, ColumnHeader, Table};

/// A table restricted to one page, with the sort that was applied.
#[derive(Debug, Clone)]
pub struct TableView {
    pub table: Table,
    pub pagination: Pagination,
    pub sort: Option<SortSpec>,
}

/// Build, optionally sort, and page a table over `items`.
///
/// Sort keys that name no column are ignored.
pub fn present<T>(
    columns: &[Column<T>],
    items: &[T],
    query: &TableQuery,
    default_per_page: u32,
) -> TableView {
    let mut table = Table::build(columns, items);

    let sort = query
        .sort_spec()
        .filter(|spec| table.sort_by_column(&spec.key, spec.descending));

    let pagination = Pagination::from_query(query, default_per_page, table.len());
    table.rows = pagination.slice(std::mem::take(&mut table.rows));

    TableView {
        table,
        pagination,
        sort,
    }
}
