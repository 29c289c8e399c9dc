pub mod flatten;

pub use flatten::{
    ElementRecord, FlattenedModule, GlobalRecord, LabelMap, RecordKind, flatten_module,
};
