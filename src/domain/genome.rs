use rand::Rng;

use crate::api::network_dto::NetworkDto;
use crate::config::GenomeConfig;
use crate::domain::network_model::network::Network;
use crate::error::ScheduleError;

pub const EVALUATION_TARGET: &str = "evaluation";

/// The operations a search harness needs to evolve schedules over one fixed topology.
///
/// Every random decision is drawn from the generator passed in, so a harness that gives each
/// worker its own seeded generator gets reproducible runs and can evaluate genomes in parallel.
#[derive(Debug, Clone)]
pub struct GenomeOperators {
    config: GenomeConfig,

    /// The topology with all-Store schedules; the baseline genome.
    baseline: Network,
}

impl GenomeOperators {
    pub fn new(topology: &NetworkDto, config: GenomeConfig) -> Result<Self, ScheduleError> {
        let baseline = Network::with_empty_schedules(topology, config.simulation)?;

        log::info!(
            "Genome operators ready for {} nodes and {} node pairs.",
            baseline.nodes().len(),
            baseline.pairs().len()
        );

        Ok(Self { config, baseline })
    }

    pub fn config(&self) -> &GenomeConfig {
        &self.config
    }

    pub fn baseline(&self) -> &Network {
        &self.baseline
    }

    /// Random valid schedule for every node of the topology.
    pub fn init<R: Rng + ?Sized>(&self, rng: &mut R) -> Network {
        let mut network = self.baseline.clone();
        network.init_random_instruction_tables(rng, self.config.initial_max_time_slots, self.config.initial_swap_chance);

        network
    }

    pub fn mutate<R: Rng + ?Sized>(&self, network: &Network, rng: &mut R) -> Network {
        let mut child = network.clone();
        child.reset();
        child.mutate(rng);

        child
    }

    /// Falls back to a copy of `first` if the parents do not share a topology.
    pub fn crossover<R: Rng + ?Sized>(&self, first: &Network, second: &Network, rng: &mut R) -> Network {
        match first.crossover(second, rng) {
            Ok(child) => child,
            Err(e) => {
                log::warn!("Crossover failed, keeping the first parent: {}", e);

                let mut child = first.clone();
                child.reset();
                child
            }
        }
    }

    /// Mean amount of entanglement over the configured trials. Each trial advances a private
    /// copy of `network` by `base + U[0, extra]` ticks, reads the score and resets.
    pub fn evaluate<R: Rng + ?Sized>(&self, network: &Network, rng: &mut R) -> f64 {
        let evaluation = self.config.evaluation;
        if evaluation.trials == 0 {
            return 0.0;
        }

        let mut trial_network = network.clone();
        trial_network.reset();

        let mut sum = 0.0;
        let mut time_slots = 0;

        for _ in 0..evaluation.trials {
            let n = evaluation.base_time_slots + rng.random_range(0..=evaluation.extra_time_slots);

            trial_network.advance_n_time_slots(n);
            sum += trial_network.amount_entanglement();
            time_slots += n;

            trial_network.reset();
        }

        let mean = sum / evaluation.trials as f64;

        tracing::info!(
            target: EVALUATION_TARGET,
            LogDescription = "Genome evaluated",
            Trials = evaluation.trials,
            TimeSlots = time_slots,
            MeanAmountOfEntanglement = mean,
        );

        mean
    }

    /// Negated [`GenomeOperators::evaluate`], for harnesses that minimise.
    pub fn cost<R: Rng + ?Sized>(&self, network: &Network, rng: &mut R) -> f64 {
        -self.evaluate(network, rng)
    }

    pub fn serialize(&self, network: &Network) -> NetworkDto {
        network.to_dto()
    }

    pub fn deserialize(&self, dto: &NetworkDto) -> Result<Network, ScheduleError> {
        Network::from_dto(dto, self.config.simulation)
    }
}
