//! Biased Matrix Factorization for explicit ratings
//!
//! Decomposes the user × product rating matrix into a global mean, per-user
//! and per-item bias terms, and low-rank latent factors:
//!
//! ```text
//! r̂(u, i) = μ + b_u + b_i + p_u · q_i
//! ```
//!
//! Two solvers are available: stochastic gradient descent over shuffled
//! ratings, and alternating least squares with closed-form bias updates.
//! All randomness comes from a seeded `StdRng`, so a fit is reproducible.

use crate::catalog::validate_interactions;
use crate::error::{RecommendError, Result};
use crate::types::{Interaction, ProductId, UserId};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Upper bound on training epochs
pub const MAX_EPOCHS: usize = 500;

/// Optimization strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    #[default]
    Sgd,
    Als,
}

/// Factorization hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorizationConfig {
    /// Number of latent factors (default: 100)
    pub latent_factors: usize,
    /// Training epochs (default: 20)
    pub epochs: usize,
    /// SGD step size (default: 0.005)
    pub learning_rate: f64,
    /// L2 regularization for biases and factors (default: 0.02)
    pub regularization: f64,
    /// Factors start uniform in [-init_scale, init_scale] (default: 0.1)
    pub init_scale: f64,
    /// Share of ratings held out for validation (default: 0.2)
    pub validation_fraction: f64,
    /// Seed for initialization, split and shuffling (default: 42)
    pub seed: u64,
    /// Lowest valid rating (default: 1)
    pub rating_min: f64,
    /// Highest valid rating (default: 5)
    pub rating_max: f64,
    pub solver: Solver,
}

impl Default for FactorizationConfig {
    fn default() -> Self {
        Self {
            latent_factors: 100,
            epochs: 20,
            learning_rate: 0.005,
            regularization: 0.02,
            init_scale: 0.1,
            validation_fraction: 0.2,
            seed: 42,
            rating_min: 1.0,
            rating_max: 5.0,
            solver: Solver::Sgd,
        }
    }
}

impl FactorizationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.latent_factors == 0 {
            return Err(RecommendError::Config(
                "latent_factors must be at least 1".to_string(),
            ));
        }
        if self.epochs == 0 || self.epochs > MAX_EPOCHS {
            return Err(RecommendError::Config(format!(
                "epochs must be in 1..={}, got {}",
                MAX_EPOCHS, self.epochs
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(RecommendError::Config(
                "learning_rate must be positive".to_string(),
            ));
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(RecommendError::Config(
                "regularization must be non-negative".to_string(),
            ));
        }
        if self.solver == Solver::Als && self.regularization <= 0.0 {
            return Err(RecommendError::Config(
                "ALS requires positive regularization".to_string(),
            ));
        }
        if !(self.init_scale.is_finite() && self.init_scale >= 0.0) {
            return Err(RecommendError::Config(
                "init_scale must be non-negative".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(RecommendError::Config(format!(
                "validation_fraction must be in [0, 1), got {}",
                self.validation_fraction
            )));
        }
        if !(self.rating_min.is_finite()
            && self.rating_max.is_finite()
            && self.rating_min < self.rating_max)
        {
            return Err(RecommendError::Config(format!(
                "invalid rating scale [{}, {}]",
                self.rating_min, self.rating_max
            )));
        }
        Ok(())
    }
}

/// Sparse user-item rating matrix
#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
    /// (user_index, item_index) -> rating, ordered for deterministic iteration
    pub entries: BTreeMap<(usize, usize), f64>,
    pub num_users: usize,
    pub num_items: usize,
}

impl SparseMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rating; a repeated (user, item) pair overwrites the previous value
    pub fn insert(&mut self, user_idx: usize, item_idx: usize, value: f64) {
        self.entries.insert((user_idx, item_idx), value);
        self.num_users = self.num_users.max(user_idx + 1);
        self.num_items = self.num_items.max(item_idx + 1);
    }

    pub fn get(&self, user_idx: usize, item_idx: usize) -> Option<f64> {
        self.entries.get(&(user_idx, item_idx)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn triples(&self) -> Vec<(usize, usize, f64)> {
        self.entries
            .iter()
            .map(|(&(u, i), &rating)| (u, i, rating))
            .collect()
    }
}

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub epochs: usize,
    pub train_size: usize,
    pub validation_size: usize,
    pub train_rmse: f64,
    /// `None` when no ratings were held out
    pub validation_rmse: Option<f64>,
}

/// Learned parameters, kept together so a prediction never sees a partial model
#[derive(Debug, Clone)]
struct Factors {
    global_mean: f64,
    user_biases: Array1<f64>,
    item_biases: Array1<f64>,
    user_factors: Array2<f64>,
    item_factors: Array2<f64>,
}

impl Factors {
    fn estimate(&self, user_idx: Option<usize>, item_idx: Option<usize>) -> f64 {
        let mut estimate = self.global_mean;
        if let Some(u) = user_idx {
            estimate += self.user_biases[u];
        }
        if let Some(i) = item_idx {
            estimate += self.item_biases[i];
        }
        if let (Some(u), Some(i)) = (user_idx, item_idx) {
            estimate += self.user_factors.row(u).dot(&self.item_factors.row(i));
        }
        estimate
    }

    fn is_finite(&self) -> bool {
        self.global_mean.is_finite()
            && self
                .user_biases
                .iter()
                .chain(self.item_biases.iter())
                .chain(self.user_factors.iter())
                .chain(self.item_factors.iter())
                .all(|v| v.is_finite())
    }

    fn rmse(&self, ratings: &[(usize, usize, f64)]) -> f64 {
        if ratings.is_empty() {
            return 0.0;
        }
        let squared: f64 = ratings
            .iter()
            .map(|&(u, i, r)| (r - self.estimate(Some(u), Some(i))).powi(2))
            .sum();
        (squared / ratings.len() as f64).sqrt()
    }
}

/// Biased latent-factor model
pub struct MatrixFactorization {
    config: FactorizationConfig,
    factors: Option<Factors>,
    /// User ID to matrix index mapping
    pub user_id_map: HashMap<UserId, usize>,
    /// Item ID to matrix index mapping
    pub item_id_map: HashMap<ProductId, usize>,
    /// Index to user ID, in first-seen order
    pub user_ids: Vec<UserId>,
    /// Index to item ID, in first-seen order
    pub item_ids: Vec<ProductId>,
}

impl MatrixFactorization {
    pub fn new(config: FactorizationConfig) -> Self {
        Self {
            config,
            factors: None,
            user_id_map: HashMap::new(),
            item_id_map: HashMap::new(),
            user_ids: Vec::new(),
            item_ids: Vec::new(),
        }
    }

    pub fn config(&self) -> &FactorizationConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.factors.is_some()
    }

    /// Build sparse matrix from rating triples
    pub fn build_matrix(&mut self, interactions: &[Interaction]) -> Result<SparseMatrix> {
        validate_interactions(interactions, self.config.rating_min, self.config.rating_max)?;

        let mut matrix = SparseMatrix::new();
        self.user_id_map.clear();
        self.item_id_map.clear();
        self.user_ids.clear();
        self.item_ids.clear();

        for interaction in interactions {
            let user_idx = match self.user_id_map.get(&interaction.user_id) {
                Some(&idx) => idx,
                None => {
                    let idx = self.user_ids.len();
                    self.user_id_map.insert(interaction.user_id, idx);
                    self.user_ids.push(interaction.user_id);
                    idx
                }
            };

            let item_idx = match self.item_id_map.get(&interaction.product_id) {
                Some(&idx) => idx,
                None => {
                    let idx = self.item_ids.len();
                    self.item_id_map.insert(interaction.product_id, idx);
                    self.item_ids.push(interaction.product_id);
                    idx
                }
            };

            if let Some(previous) = matrix.get(user_idx, item_idx) {
                tracing::debug!(
                    user_id = interaction.user_id,
                    product_id = interaction.product_id,
                    previous,
                    rating = interaction.rating,
                    "repeated rating replaces earlier value"
                );
            }
            matrix.insert(user_idx, item_idx, interaction.rating);
        }

        Ok(matrix)
    }

    /// Train on the matrix, holding out a validation split for monitoring
    pub fn fit(&mut self, matrix: &SparseMatrix) -> Result<TrainingReport> {
        self.config.validate()?;
        if matrix.is_empty() {
            return Err(RecommendError::InsufficientData(
                "cannot factorize an empty rating matrix".to_string(),
            ));
        }

        let k = self.config.latent_factors;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let scale = self.config.init_scale;
        let mut init = |rows: usize| {
            Array2::from_shape_simple_fn((rows, k), || (rng.gen::<f64>() * 2.0 - 1.0) * scale)
        };
        let user_factors = init(matrix.num_users);
        let item_factors = init(matrix.num_items);

        let mut ratings = matrix.triples();
        ratings.shuffle(&mut rng);
        let validation_size = self.validation_size(ratings.len());
        let train = ratings.split_off(validation_size);
        let validation = ratings;

        let global_mean = train.iter().map(|&(_, _, r)| r).sum::<f64>() / train.len() as f64;

        let mut factors = Factors {
            global_mean,
            user_biases: Array1::zeros(matrix.num_users),
            item_biases: Array1::zeros(matrix.num_items),
            user_factors,
            item_factors,
        };

        match self.config.solver {
            Solver::Sgd => self.run_sgd(&mut factors, train.clone(), &validation, &mut rng),
            Solver::Als => self.run_als(&mut factors, &train, &validation, matrix)?,
        }

        let train_rmse = factors.rmse(&train);
        if !train_rmse.is_finite() || !factors.is_finite() {
            return Err(RecommendError::Internal(format!(
                "factorization diverged (train rmse {train_rmse})"
            )));
        }

        let report = TrainingReport {
            epochs: self.config.epochs,
            train_size: train.len(),
            validation_size: validation.len(),
            train_rmse,
            validation_rmse: (!validation.is_empty()).then(|| factors.rmse(&validation)),
        };

        self.factors = Some(factors);
        Ok(report)
    }

    fn validation_size(&self, total: usize) -> usize {
        if total < 2 {
            return 0;
        }
        let held_out = (total as f64 * self.config.validation_fraction).ceil() as usize;
        held_out.min(total - 1)
    }

    fn log_epoch(
        &self,
        epoch: usize,
        factors: &Factors,
        train: &[(usize, usize, f64)],
        validation: &[(usize, usize, f64)],
    ) {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let train_rmse = factors.rmse(train);
            let validation_rmse = factors.rmse(validation);
            tracing::debug!(
                epoch,
                train_rmse,
                validation_rmse,
                "factorization epoch complete"
            );
        }
    }

    fn run_sgd(
        &self,
        factors: &mut Factors,
        mut train: Vec<(usize, usize, f64)>,
        validation: &[(usize, usize, f64)],
        rng: &mut StdRng,
    ) {
        let lr = self.config.learning_rate;
        let reg = self.config.regularization;
        let k = self.config.latent_factors;

        for epoch in 0..self.config.epochs {
            train.shuffle(rng);

            for &(u, i, rating) in &train {
                let error = rating - factors.estimate(Some(u), Some(i));

                let bu = factors.user_biases[u];
                let bi = factors.item_biases[i];
                factors.user_biases[u] += lr * (error - reg * bu);
                factors.item_biases[i] += lr * (error - reg * bi);

                for f in 0..k {
                    let puf = factors.user_factors[[u, f]];
                    let qif = factors.item_factors[[i, f]];
                    factors.user_factors[[u, f]] += lr * (error * qif - reg * puf);
                    factors.item_factors[[i, f]] += lr * (error * puf - reg * qif);
                }
            }

            self.log_epoch(epoch, factors, &train, validation);
        }
    }

    fn run_als(
        &self,
        factors: &mut Factors,
        train: &[(usize, usize, f64)],
        validation: &[(usize, usize, f64)],
        matrix: &SparseMatrix,
    ) -> Result<()> {
        let lambda = self.config.regularization;

        let mut by_user: Vec<Vec<(usize, f64)>> = vec![Vec::new(); matrix.num_users];
        let mut by_item: Vec<Vec<(usize, f64)>> = vec![Vec::new(); matrix.num_items];
        for &(u, i, rating) in train {
            by_user[u].push((i, rating));
            by_item[i].push((u, rating));
        }

        for epoch in 0..self.config.epochs {
            // Users: biases first, then factors against the bias-corrected targets
            for (u, rated) in by_user.iter().enumerate() {
                if rated.is_empty() {
                    continue;
                }
                let residual: f64 = rated
                    .iter()
                    .map(|&(i, r)| {
                        r - factors.global_mean
                            - factors.item_biases[i]
                            - factors.user_factors.row(u).dot(&factors.item_factors.row(i))
                    })
                    .sum();
                factors.user_biases[u] = residual / (lambda + rated.len() as f64);

                let targets: Vec<(usize, f64)> = rated
                    .iter()
                    .map(|&(i, r)| {
                        (
                            i,
                            r - factors.global_mean - factors.user_biases[u] - factors.item_biases[i],
                        )
                    })
                    .collect();
                let row = Self::solve_row(&targets, &factors.item_factors, lambda)?;
                factors.user_factors.row_mut(u).assign(&row);
            }

            // Items, against the freshly updated users
            for (i, raters) in by_item.iter().enumerate() {
                if raters.is_empty() {
                    continue;
                }
                let residual: f64 = raters
                    .iter()
                    .map(|&(u, r)| {
                        r - factors.global_mean
                            - factors.user_biases[u]
                            - factors.user_factors.row(u).dot(&factors.item_factors.row(i))
                    })
                    .sum();
                factors.item_biases[i] = residual / (lambda + raters.len() as f64);

                let targets: Vec<(usize, f64)> = raters
                    .iter()
                    .map(|&(u, r)| {
                        (
                            u,
                            r - factors.global_mean - factors.user_biases[u] - factors.item_biases[i],
                        )
                    })
                    .collect();
                let row = Self::solve_row(&targets, &factors.user_factors, lambda)?;
                factors.item_factors.row_mut(i).assign(&row);
            }

            self.log_epoch(epoch, factors, train, validation);
        }

        Ok(())
    }

    /// Regularized least squares for one factor row:
    /// (Σ v vᵀ + λI) x = Σ t v over the fixed-side rows `v` with targets `t`
    fn solve_row(
        targets: &[(usize, f64)],
        fixed: &Array2<f64>,
        lambda: f64,
    ) -> Result<Array1<f64>> {
        let k = fixed.ncols();
        let mut a = Array2::<f64>::zeros((k, k));
        let mut b = Array1::<f64>::zeros(k);

        for &(idx, target) in targets {
            let v = fixed.row(idx);
            for i in 0..k {
                for j in 0..k {
                    a[[i, j]] += v[i] * v[j];
                }
                b[i] += target * v[i];
            }
        }

        for i in 0..k {
            a[[i, i]] += lambda;
        }

        Self::solve_least_squares(&a, &b)
    }

    /// Solve A * x = b using Cholesky decomposition
    /// For positive definite matrix A (which we guarantee by adding regularization)
    fn solve_least_squares(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
        let n = a.nrows();

        // A = L * L^T
        let mut l = Array2::<f64>::zeros((n, n));

        for i in 0..n {
            for j in 0..=i {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += l[[i, k]] * l[[j, k]];
                }

                if i == j {
                    let diag = a[[i, i]] - sum;
                    if diag <= 0.0 {
                        return Err(RecommendError::Internal(
                            "normal equations are not positive definite".to_string(),
                        ));
                    }
                    l[[i, j]] = diag.sqrt();
                } else {
                    l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
                }
            }
        }

        // Forward substitution: L * y = b
        let mut y = Array1::<f64>::zeros(n);
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += l[[i, j]] * y[j];
            }
            y[i] = (b[i] - sum) / l[[i, i]];
        }

        // Backward substitution: L^T * x = y
        let mut x = Array1::<f64>::zeros(n);
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += l[[j, i]] * x[j];
            }
            x[i] = (y[i] - sum) / l[[i, i]];
        }

        Ok(x)
    }

    /// Predict a rating clipped to the rating scale.
    ///
    /// Unknown users fall back to μ + b_i, unknown items to μ + b_u, and a
    /// pair where both are unknown to the global mean.
    pub fn predict(&self, user_id: UserId, item_id: ProductId) -> Result<f64> {
        let factors = self
            .factors
            .as_ref()
            .ok_or_else(|| RecommendError::Internal("model not trained yet".to_string()))?;

        let user_idx = self.user_id_map.get(&user_id).copied();
        let item_idx = self.item_id_map.get(&item_id).copied();

        Ok(factors
            .estimate(user_idx, item_idx)
            .clamp(self.config.rating_min, self.config.rating_max))
    }

    pub fn global_mean(&self) -> Option<f64> {
        self.factors.as_ref().map(|f| f.global_mean)
    }

    /// Latent factor row for a user
    pub fn user_embedding(&self, user_id: UserId) -> Option<Vec<f64>> {
        let idx = *self.user_id_map.get(&user_id)?;
        self.factors
            .as_ref()
            .map(|f| f.user_factors.row(idx).to_vec())
    }

    /// Latent factor row for an item
    pub fn item_embedding(&self, item_id: ProductId) -> Option<Vec<f64>> {
        let idx = *self.item_id_map.get(&item_id)?;
        self.factors
            .as_ref()
            .map(|f| f.item_factors.row(idx).to_vec())
    }
}
