//! The scheduler — periodic calculation and linalg demo rounds.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tracing::{error, info, warn};

use meshcalc_registry::{MemberHandle, MemberTable, ServiceKind};
use meshcalc_rpc::{Frame, RpcClient, RpcError, RpcResult};
use meshcalc_wire::{decode, encode, shape_of, Matrix};

/// Drives periodic remote calls against randomly selected members.
///
/// Cloneable so each loop can own its copy; all clones share the member
/// table and the broker routing underneath the client.
#[derive(Clone)]
pub struct Scheduler {
    table: Arc<MemberTable>,
    client: RpcClient,
    calc_interval: Duration,
    linalg_interval: Duration,
    call_timeout: Duration,
}

impl Scheduler {
    /// Create a scheduler with the default cadence: calculations every
    /// 2s, linalg demos every 3s, 3s per-call deadline.
    pub fn new(table: Arc<MemberTable>, client: RpcClient) -> Self {
        Self {
            table,
            client,
            calc_interval: Duration::from_secs(2),
            linalg_interval: Duration::from_secs(3),
            call_timeout: Duration::from_secs(3),
        }
    }

    /// Override the tick intervals.
    pub fn with_intervals(mut self, calc: Duration, linalg: Duration) -> Self {
        self.calc_interval = calc;
        self.linalg_interval = linalg;
        self
    }

    /// Override the per-call deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Run both periodic loops until the shutdown signal fires.
    ///
    /// The loops tick independently and never block each other; a failing
    /// round is logged and the loop carries on.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let calc = tokio::spawn(self.clone().calc_loop(shutdown.clone()));
        let linalg = tokio::spawn(self.linalg_loop(shutdown));
        let _ = calc.await;
        let _ = linalg.await;
    }

    async fn calc_loop(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.calc_interval, "calculation loop started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.calc_interval) => {
                    if let Err(e) = self.calc_round().await {
                        error!(error = %e, "remote calculation round failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("calculation loop shutting down");
                    break;
                }
            }
        }
    }

    async fn linalg_loop(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.linalg_interval, "linalg loop started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.linalg_interval) => {
                    self.linalg_round().await;
                }
                _ = shutdown.changed() => {
                    info!("linalg loop shutting down");
                    break;
                }
            }
        }
    }

    /// One calculation round: sum and subtract two random numbers on a
    /// randomly selected calculator member.
    pub async fn calc_round(&self) -> RpcResult<()> {
        let (a, b) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(0..1000i64), rng.gen_range(0..1000i64))
        };
        let member = self.pick(ServiceKind::Calculator)?;
        info!(a, b, service = %member.descriptor(), "doing remote calculations");

        let args = vec![a.to_string().into_bytes(), b.to_string().into_bytes()];

        let (tag, sum) = self
            .call_arith(&member, "calculate-sum", args.clone())
            .await?;
        info!(a, b, result = sum, implementation = %tag, "remote calculate-sum");

        // Historical command spelling, preserved verbatim: command matching
        // is exact-string, and the workers register "calculate-subtract".
        let (tag, difference) = self
            .call_arith(&member, "calculate-substract", args)
            .await?;
        info!(a, b, result = difference, implementation = %tag, "remote calculate-substract");
        Ok(())
    }

    /// One linalg round: the three demo flavours, each logged on its own.
    pub async fn linalg_round(&self) {
        let a = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let b = vec![vec![2], vec![2], vec![2]];
        info!("matrix multiplication with constant matrices, expecting a valid response");
        self.report_matmul(&a, &b, true).await;

        let b_bad = vec![vec![2], vec![2], vec![2], vec![2]];
        info!("matrix multiplication with constant matrices, expecting a shape error");
        self.report_matmul(&a, &b_bad, false).await;

        let (a, b) = {
            let mut rng = rand::thread_rng();
            let a_rows = rng.gen_range(1..5);
            let a_cols = rng.gen_range(1..5);
            let b_cols = rng.gen_range(1..5);
            // Inner dimensions must agree for a valid product.
            (
                random_matrix(a_rows, a_cols, &mut rng),
                random_matrix(a_cols, b_cols, &mut rng),
            )
        };
        info!("matrix multiplication with random matrices, expecting a valid response");
        self.report_matmul(&a, &b, true).await;
    }

    async fn report_matmul(&self, a: &Matrix, b: &Matrix, expect_success: bool) {
        match (self.remote_matmul(a, b).await, expect_success) {
            (Ok(result), _) => {
                let (rows, cols) = shape_of(&result);
                info!(shape = %format!("{rows},{cols}"), ?result, "remote linalg-matmul");
            }
            (Err(e), true) => error!(error = %e, "remote linalg-matmul failed"),
            (Err(e), false) => info!(error = %e, "remote linalg-matmul failed as expected"),
        }
    }

    /// Multiply two matrices on a randomly selected linalg member.
    pub async fn remote_matmul(&self, a: &Matrix, b: &Matrix) -> RpcResult<Matrix> {
        let member = self.pick(ServiceKind::Linalg)?;

        let (shape_a, bytes_a) = encode(a);
        let (shape_b, bytes_b) = encode(b);
        let args = vec![shape_a.into_bytes(), bytes_a, shape_b.into_bytes(), bytes_b];

        let response = self
            .client
            .call(member.descriptor(), "linalg-matmul", args, self.call_timeout)
            .await?;

        if response.len() != 2 {
            return Err(RpcError::RemoteError(format!(
                "malformed matmul response: expected 2 fields, got {}",
                response.len()
            )));
        }
        let shape = std::str::from_utf8(&response[0])
            .map_err(|_| RpcError::RemoteError("matmul response shape is not UTF-8".to_string()))?;
        decode(shape, &response[1])
            .map_err(|e| RpcError::RemoteError(format!("matmul response matrix: {e}")))
    }

    /// Selection policy: uniform random member of the wanted kind, or a
    /// short-circuit without any network I/O when none is registered.
    fn pick(&self, kind: ServiceKind) -> RpcResult<MemberHandle> {
        self.table.pick_random(kind.tag()).ok_or_else(|| {
            warn!(service_type = kind.tag(), "no available and registered member found");
            RpcError::NoAvailableMember(kind.tag().to_string())
        })
    }

    async fn call_arith(
        &self,
        member: &MemberHandle,
        command: &str,
        args: Vec<Frame>,
    ) -> RpcResult<(String, i64)> {
        let response = self
            .client
            .call(member.descriptor(), command, args, self.call_timeout)
            .await?;
        parse_arith_response(&response)
    }
}

/// Parse the `[impl_tag, result]` convention of arithmetic responses.
fn parse_arith_response(frames: &[Frame]) -> RpcResult<(String, i64)> {
    if frames.len() != 2 {
        return Err(RpcError::RemoteError(format!(
            "malformed response: expected 2 fields, got {}",
            frames.len()
        )));
    }
    let tag = String::from_utf8_lossy(&frames[0]).into_owned();
    let value = std::str::from_utf8(&frames[1])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            RpcError::RemoteError(format!("response is not an integer: {:?}", frames[1]))
        })?;
    Ok((tag, value))
}

/// Generate a `rows × cols` matrix with entries below 1000.
fn random_matrix(rows: usize, cols: usize, rng: &mut impl Rng) -> Matrix {
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.gen_range(0..1000)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use meshcalc_registry::{ServiceDescriptor, ServiceRegistry};
    use meshcalc_rpc::LocalBroker;
    use meshcalc_services::{calc_registry, linalg_registry};

    struct Harness {
        broker: LocalBroker,
        table: Arc<MemberTable>,
        scheduler: Scheduler,
    }

    fn harness() -> Harness {
        let broker = LocalBroker::new();
        let table = Arc::new(MemberTable::new());
        let scheduler = Scheduler::new(table.clone(), RpcClient::new(broker.clone()))
            .with_call_timeout(Duration::from_secs(1));
        Harness {
            broker,
            table,
            scheduler,
        }
    }

    impl Harness {
        fn add_calc_worker(&self, id: &str) -> ServiceDescriptor {
            let descriptor = ServiceDescriptor::new("calc", id);
            self.broker.serve(&descriptor, calc_registry("rust"));
            ServiceRegistry::new(self.table.clone())
                .handle_join(&descriptor)
                .unwrap();
            descriptor
        }

        fn add_linalg_worker(&self, id: &str) -> ServiceDescriptor {
            let descriptor = ServiceDescriptor::new("linalg", id);
            self.broker.serve(&descriptor, linalg_registry());
            ServiceRegistry::new(self.table.clone())
                .handle_join(&descriptor)
                .unwrap();
            descriptor
        }
    }

    #[tokio::test]
    async fn calc_round_without_members_short_circuits() {
        let h = harness();

        let err = h.scheduler.calc_round().await.unwrap_err();
        assert_eq!(err, RpcError::NoAvailableMember("calc".to_string()));
    }

    #[tokio::test]
    async fn calc_round_hits_subtract_spelling_mismatch() {
        let h = harness();
        h.add_calc_worker("w1");

        // The sum call succeeds, then the round fails on the misspelled
        // subtraction command that no worker registers.
        let err = h.scheduler.calc_round().await.unwrap_err();
        match err {
            RpcError::RemoteError(message) => {
                assert!(message.contains("unknown command"), "{message}");
                assert!(message.contains("calculate-substract"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn correctly_spelled_subtract_succeeds() {
        let h = harness();
        let descriptor = h.add_calc_worker("w1");

        let response = RpcClient::new(h.broker.clone())
            .call(
                &descriptor,
                "calculate-subtract",
                vec![b"7".to_vec(), b"5".to_vec()],
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(response[1], b"2".to_vec());
    }

    #[tokio::test]
    async fn remote_matmul_valid() {
        let h = harness();
        h.add_linalg_worker("w1");

        let a = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let b = vec![vec![2], vec![2], vec![2]];
        let result = h.scheduler.remote_matmul(&a, &b).await.unwrap();

        assert_eq!(result, vec![vec![12], vec![30]]);
    }

    #[tokio::test]
    async fn remote_matmul_shape_mismatch_surfaces_as_remote_error() {
        let h = harness();
        h.add_linalg_worker("w1");

        let a = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let b = vec![vec![2], vec![2], vec![2], vec![2]];
        let err = h.scheduler.remote_matmul(&a, &b).await.unwrap_err();

        match err {
            RpcError::RemoteError(message) => {
                assert!(message.contains("shape mismatch"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn remote_matmul_without_members_short_circuits() {
        let h = harness();

        let err = h
            .scheduler
            .remote_matmul(&vec![vec![1]], &vec![vec![1]])
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::NoAvailableMember("linalg".to_string()));
    }

    #[tokio::test]
    async fn linalg_round_survives_missing_workers() {
        let h = harness();
        // No members registered: each flavour logs and moves on.
        h.scheduler.linalg_round().await;
    }

    #[tokio::test]
    async fn loops_stop_on_shutdown() {
        let h = harness();
        h.add_calc_worker("w1");
        h.add_linalg_worker("w2");

        let scheduler = h
            .scheduler
            .clone()
            .with_intervals(Duration::from_millis(10), Duration::from_millis(10));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }

    #[test]
    fn random_matrix_dimensions_and_range() {
        let mut rng = rand::thread_rng();
        let matrix = random_matrix(3, 4, &mut rng);

        assert_eq!(shape_of(&matrix), (3, 4));
        assert!(matrix.iter().flatten().all(|&v| (0..1000).contains(&v)));
    }

    #[test]
    fn parse_arith_response_conventions() {
        let ok = parse_arith_response(&[b"go".to_vec(), b"12".to_vec()]).unwrap();
        assert_eq!(ok, ("go".to_string(), 12));

        assert!(matches!(
            parse_arith_response(&[b"go".to_vec()]),
            Err(RpcError::RemoteError(_))
        ));
        assert!(matches!(
            parse_arith_response(&[b"go".to_vec(), b"twelve".to_vec()]),
            Err(RpcError::RemoteError(_))
        ));
    }
}
