// Snapshot of the facade's dirty flags, handed to every subscriber once
// per mutating operation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ChangeEvent {
    pub update_graph: bool,
    pub draw_graph: bool,
}

pub(crate) type Subscriber = Box<dyn FnMut(ChangeEvent)>;
