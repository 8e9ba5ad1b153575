/// Split `items` into consecutive batches of at most `max_size`, keeping order.
///
/// Produces `ceil(len / max_size)` batches; only the last may be short.
/// A `max_size` of zero is treated as one so no item is ever dropped.
pub fn chunk<T>(items: Vec<T>, max_size: usize) -> Vec<Vec<T>> {
    let max_size = max_size.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(max_size));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        batches.push(iter.by_ref().take(max_size).collect());
    }
    batches
}
