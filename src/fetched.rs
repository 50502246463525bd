use tracing::warn;

/// Outcome of a read that is allowed to fall back instead of failing.
///
/// `Degraded` still carries a usable value (a default, an empty list, or a
/// result computed from partially substituted inputs).
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Ok(T),
    Degraded(T),
}

impl<T> Fetched<T> {
    /// Keeps `res` on success; logs the failure and substitutes `fallback()` otherwise.
    pub fn recover(res: anyhow::Result<T>, what: &'static str, fallback: impl FnOnce() -> T) -> Self {
        match res {
            Ok(v) => Fetched::Ok(v),
            Err(e) => {
                warn!(error = %format!("{e:#}"), what, "fetch failed; using fallback");
                Fetched::Degraded(fallback())
            }
        }
    }

    pub fn new(value: T, degraded: bool) -> Self {
        if degraded {
            Fetched::Degraded(value)
        } else {
            Fetched::Ok(value)
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Fetched::Ok(v) | Fetched::Degraded(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Fetched::Ok(v) | Fetched::Degraded(v) => v,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Ok(v) => Fetched::Ok(f(v)),
            Fetched::Degraded(v) => Fetched::Degraded(f(v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recover_marks_the_path_taken() {
        let ok = Fetched::recover(Ok(vec![1, 2]), "rows", Vec::new);
        assert_eq!(ok, Fetched::Ok(vec![1, 2]));

        let bad: Fetched<Vec<i32>> =
            Fetched::recover(Err(anyhow::anyhow!("boom")), "rows", Vec::new);
        assert!(bad.is_degraded());
        assert!(bad.value().is_empty());
    }

    #[test]
    fn map_preserves_degradation() {
        assert_eq!(Fetched::Degraded(2).map(|v| v * 10), Fetched::Degraded(20));
        assert_eq!(Fetched::new(1, false).map(|v| v + 1).into_inner(), 2);
    }
}
