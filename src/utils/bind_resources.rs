use wgpu::{BindGroup, BindGroupLayout};

// A bind group together with the layout it was built from, so a pass can hand
// the layout to pipeline creation and the group to encoding.
pub struct BindResources {
    pub bind_group: BindGroup,
    pub bind_group_layout: BindGroupLayout,
}

impl BindResources {
    pub fn new(bind_group_layout: BindGroupLayout, bind_group: BindGroup) -> Self {
        Self {
            bind_group,
            bind_group_layout,
        }
    }
}
