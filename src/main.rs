use kairos::{
    EntityId, FnEntity, Operation, Recorder, Relay, RunOutcome, SimulationBuilder, SimulationContext,
    VirtualTime, DELIVER,
};
use tracing_subscriber::EnvFilter;

const PRODUCE: Operation = Operation::from_static("produce");

const PRODUCER: u64 = 0;
const STAGE: u64 = 1;
const SINK: u64 = 2;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("═══════════════════════════════════════════════════════");
    println!("  Kairos — Discrete-Event Scheduling Core");
    println!("  Producer → Relay → Recorder pipeline");
    println!("═══════════════════════════════════════════════════════");
    println!();

    let first = run_pipeline("Run 1");
    let second = run_pipeline("Run 2");

    println!("  Verification:");
    if first == second {
        println!("    ✓ Both runs delivered identical (time, item) sequences.");
    } else {
        println!("    ✗ MISMATCH — runs diverged!");
    }
}

/// Producer emits one item every 3 ticks, the relay adds 2 ticks of
/// latency, and the recorder collects. The producer goes quiet after its
/// tenth item, so the run drains.
fn run_pipeline(label: &str) -> Vec<(u64, u32)> {
    let producer = FnEntity::new(
        [PRODUCE],
        |ctx: &mut SimulationContext<'_, u32>, _op: &Operation, item: &u32| {
            ctx.schedule(DELIVER, EntityId::new(STAGE), 0, *item)?;
            if *item < 9 {
                ctx.schedule_self(PRODUCE, 3, item + 1)?;
            }
            Ok(())
        },
    );

    let built = SimulationBuilder::<u32>::new()
        .record_trace(true)
        .entity(PRODUCER, producer)
        .relay(STAGE, SINK, 2)
        .recorder(SINK)
        .schedule(PRODUCE, PRODUCER, 0, 0)
        .build();

    let mut sim = match built {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("  {}: setup failed: {}", label, err);
            return Vec::new();
        }
    };

    let outcome = match sim.run(VirtualTime::new(1_000)) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("  {}: run failed: {}", label, err);
            return Vec::new();
        }
    };

    let sink = EntityId::new(SINK);
    let delivered: Vec<(u64, u32)> = sim
        .entity::<Recorder<u32>>(sink)
        .map(|r| r.received.iter().map(|(t, _, item)| (t.ticks(), *item)).collect())
        .unwrap_or_default();

    println!(
        "  {}: {} after {} events, clock at {}",
        label,
        outcome,
        sim.events_processed(),
        sim.now()
    );
    if outcome == RunOutcome::Drained {
        for (time, item) in &delivered {
            println!("    T={:>3}  item {}", time, item);
        }
    }
    if let Some(relay) = sim.entity::<Relay>(EntityId::new(STAGE)) {
        println!("    relay forwarded {} items", relay.forwarded);
    }
    println!("    trace: {} entries", sim.trace().len());
    println!();

    delivered
}
