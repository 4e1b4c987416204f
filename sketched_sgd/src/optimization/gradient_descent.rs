use count_sketch::Recovered;

use super::Optimizer;

/// Gradient descent optimization algorithm.
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    /// Returns a new `GradientDescent`.
    ///
    /// # Args
    /// * `learning_rate` - The *length* of the steps taken on updates.
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }

    /// Returns the configured learning rate.
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

impl Optimizer for GradientDescent {
    /// Updates the parameters according to the algorithm's learning rule,
    /// that is, making a step in the opposite direction of the gradient,
    /// with a length of `learning_rate`.
    ///
    /// # Args
    /// * `params` - The parameters that are going to be modified.
    /// * `grad` - The gradient used for taking the step.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) {
        let lr = self.learning_rate;

        for (w, g) in params.iter_mut().zip(grad) {
            *w -= lr * g;
        }
    }

    /// Same rule restricted to the recovered coordinates, so the apply step
    /// stays proportional to the sparsity budget rather than the parameter
    /// count.
    fn update_sparse(&mut self, params: &mut [f32], update: &[Recovered]) {
        let lr = self.learning_rate;

        for entry in update {
            params[entry.index] -= lr * entry.value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_update_steps_against_the_gradient() {
        let mut params = [1.0, 2.0, 3.0];
        let grad = [10.0, 0.0, -10.0];

        let mut gd = GradientDescent::new(0.1);
        gd.update_params(&mut params, &grad);

        assert_eq!(params, [0.0, 2.0, 4.0]);
    }

    #[test]
    fn sparse_update_leaves_other_coordinates_untouched() {
        let mut params = [1.0, 2.0, 3.0, 4.0];
        let update = [
            Recovered { index: 0, value: 10.0 },
            Recovered { index: 3, value: -10.0 },
        ];

        let mut gd = GradientDescent::new(0.1);
        gd.update_sparse(&mut params, &update);

        assert_eq!(params, [0.0, 2.0, 3.0, 5.0]);
    }
}
