pub mod sidebar;
pub mod task_list;
