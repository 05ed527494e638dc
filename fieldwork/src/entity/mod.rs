pub mod app_user;
pub mod dataset;
pub mod dataset_field;
pub mod dataset_group_mapping_area;
pub mod dataset_shared_group;
pub mod dataset_shared_user;
pub mod dataset_user_mapping_area;
pub mod entry;
pub mod entry_field_value;
pub mod entry_file;
pub mod export_task;
pub mod geometry;
pub mod group_member;
pub mod mapping_area;
pub mod mapping_area_user;
pub mod typology;
pub mod typology_entry;
pub mod user_group;
