mod ast_table;
pub use ast_table::{AstTable, ColumnKind, NOT_RECOVERED_MAG};

mod sed_grid;
pub use sed_grid::SedGrid;
