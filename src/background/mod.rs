mod mixture;
mod neighbor;
pub mod types;

pub use mixture::{MixtureConfig, MixtureModel};
pub use neighbor::{NeighborConfig, NeighborModel};
pub use types::{
    empty_mask, foreground_count, BackgroundModel, ForegroundMask, Frame, ModelKind, BACKGROUND,
    FOREGROUND,
};

/// Create a background model of the requested kind
pub fn create_model(
    kind: ModelKind,
    mixture: &MixtureConfig,
    neighbor: &NeighborConfig,
) -> Box<dyn BackgroundModel> {
    match kind {
        ModelKind::Mixture => Box::new(MixtureModel::new(mixture.clone())),
        ModelKind::Neighbor => Box::new(NeighborModel::new(neighbor.clone())),
    }
}
