mod state;
mod view;

pub use state::PreviewState;
pub use view::PreviewView;
