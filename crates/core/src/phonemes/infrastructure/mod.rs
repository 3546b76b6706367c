pub mod cost_table_loader;
