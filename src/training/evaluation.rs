/// A single key of an evaluation batch with its true and predicted position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub key: f32,
    pub position: f32,
    pub predicted: f32,
}

impl Prediction {
    #[inline]
    pub fn error(&self) -> f32 {
        self.predicted - self.position
    }
}

/// The outcome of evaluating a trained model over one batch, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    predictions: Vec<Prediction>,
}

impl Evaluation {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self { predictions }
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Mean of the absolute position errors, `0` for an empty evaluation.
    pub fn mean_abs_error(&self) -> f32 {
        if self.predictions.is_empty() {
            return 0.0;
        }

        let total: f64 = self.predictions.iter().map(|p| p.error().abs() as f64).sum();
        (total / self.predictions.len() as f64) as f32
    }

    pub fn max_abs_error(&self) -> f32 {
        self.predictions
            .iter()
            .map(|p| p.error().abs())
            .fold(0.0, f32::max)
    }

    /// Spearman rank correlation between the true and the predicted positions.
    ///
    /// Ties get the average of the ranks they span. Returns `0` when either side has no
    /// variance, which includes evaluations of fewer than two keys.
    pub fn spearman(&self) -> f32 {
        let positions: Vec<_> = self.predictions.iter().map(|p| p.position).collect();
        let predicted: Vec<_> = self.predictions.iter().map(|p| p.predicted).collect();

        pearson(&ranks(&positions), &ranks(&predicted))
    }
}

fn ranks(values: &[f32]) -> Vec<f64> {
    let mut order: Vec<_> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }

        // ranks are 1-based, a tie spanning [start, end) shares their mean
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }

        start = end;
    }

    ranks
}

fn pearson(a: &[f64], b: &[f64]) -> f32 {
    let n = a.len() as f64;
    if a.len() < 2 {
        return 0.0;
    }

    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }

    (cov / (var_a * var_b).sqrt()) as f32
}
