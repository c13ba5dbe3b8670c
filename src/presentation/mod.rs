mod dispatch;
mod outline;

pub use dispatch::{
    FieldRenderer, FlowStepView, FlowView, LeafView, RenderContext, RepeatableView, render_form,
    render_node,
};
pub use outline::OutlineRenderer;
