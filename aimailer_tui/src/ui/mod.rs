pub mod main_view;
