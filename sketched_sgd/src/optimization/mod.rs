mod gradient_descent;

pub use gradient_descent::GradientDescent;

use count_sketch::Recovered;

/// Base update rule the sketched optimizer decorates.
pub trait Optimizer {
    /// Applies a dense gradient to the parameters.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]);

    /// Applies a sparse recovered update to the parameters, touching only
    /// the listed coordinates.
    fn update_sparse(&mut self, params: &mut [f32], update: &[Recovered]);
}
