pub mod app;
pub mod input;
pub mod result_list;

pub use app::App;
pub use input::InputWidget;
pub use result_list::ResultList;
