pub mod grasp;
pub mod gui_app;
pub mod labels;
pub mod session;
pub mod similarity;
pub mod viewport;
pub mod walk;
