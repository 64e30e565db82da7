use std::process::ExitCode;
use std::thread;

use election_polynomial::{
    compute_coordinate, generate_polynomial, verify_coordinate, Coordinate, ElectionPolynomial,
    ElementModP, ElementModQ, GroupContext, LagrangeCoefficientsRecord, PolynomialError,
    PublicPolynomial, SecureSampler,
};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const GUARDIANS: u64 = 5;
const QUORUM: usize = 3;

type GuardianIndex = u64;

#[derive(Debug, Error)]
enum CeremonyError {
    #[error(transparent)]
    Polynomial(#[from] PolynomialError),
    #[error("guardian {0} published an invalid possession proof")]
    InvalidProof(GuardianIndex),
    #[error("share from guardian {sender} to guardian {receiver} failed verification")]
    InvalidShare {
        sender: GuardianIndex,
        receiver: GuardianIndex,
    },
    #[error("quorum {0:?} did not reconstruct the missing guardian's secret")]
    ReconstructionMismatch(Vec<GuardianIndex>),
}

// Simulates one key ceremony in-process: every guardian deals shares to every
// other guardian, shares are checked against the dealer's commitments, then a
// quorum rebuilds guardian 1's secret from their backups.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let group = match std::env::args().nth(1) {
        Some(path) => match load_group(&path) {
            Ok(group) => group,
            Err(e) => {
                error!("could not load group from {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => GroupContext::production().clone(),
    };

    match run_ceremony(&group) {
        Ok(joint_key) => {
            info!("Key ceremony successful!");
            info!("joint election key: {}", joint_key.to_hex());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Key ceremony failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_group(path: &str) -> Result<GroupContext, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(GroupContext::from_json(&json)?)
}

fn run_ceremony(group: &GroupContext) -> Result<ElementModP, CeremonyError> {
    // Each guardian samples with its own generator.
    let polynomials: Vec<ElectionPolynomial> = thread::scope(|scope| {
        let handles: Vec<_> = (1..=GUARDIANS)
            .map(|_| scope.spawn(|| generate_polynomial(group, QUORUM, &mut SecureSampler::new())))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("guardian thread panicked"))
            .collect::<Result<_, _>>()
    })?;

    for (guardian, polynomial) in (1..=GUARDIANS).zip(&polynomials) {
        if !polynomial.verify_proofs(group) {
            return Err(CeremonyError::InvalidProof(guardian));
        }
    }

    for (sender, polynomial) in (1..=GUARDIANS).zip(&polynomials) {
        let commitments = polynomial.commitments();
        for receiver in (1..=GUARDIANS).filter(|r| *r != sender) {
            let share = compute_coordinate(group, receiver, polynomial);
            check_share(group, sender, receiver, &share, &commitments)?;
        }
    }
    info!(guardians = GUARDIANS, quorum = QUORUM, "all shares distributed");

    // Guardian 1 is missing; guardians 2..=4 hold its backups.
    let dealer = &polynomials[0];
    let quorum: Vec<GuardianIndex> = (2..=QUORUM as u64 + 1).collect();
    let backups: Vec<Coordinate> = quorum
        .iter()
        .map(|x| compute_coordinate(group, *x, dealer))
        .collect();
    let rebuilt = recover_secret(group, &quorum, &backups)?;
    if &rebuilt != dealer.secret() {
        return Err(CeremonyError::ReconstructionMismatch(quorum));
    }
    info!(?quorum, "quorum reconstructed guardian 1 secret");

    let public: Vec<PublicPolynomial> = polynomials.into_iter().map(ElectionPolynomial::into_public).collect();
    Ok(public
        .iter()
        .fold(group.one_p(), |acc, p| group.mul_p(&acc, &p.commitments()[0])))
}

fn check_share(
    group: &GroupContext,
    sender: GuardianIndex,
    receiver: GuardianIndex,
    share: &Coordinate,
    commitments: &[ElementModP],
) -> Result<(), CeremonyError> {
    if verify_coordinate(group, share, receiver, commitments) {
        Ok(())
    } else {
        Err(CeremonyError::InvalidShare { sender, receiver })
    }
}

fn recover_secret(
    group: &GroupContext,
    quorum: &[GuardianIndex],
    shares: &[Coordinate],
) -> Result<ElementModQ, CeremonyError> {
    let record = LagrangeCoefficientsRecord::for_quorum(group, quorum)?;
    Ok(shares
        .iter()
        .zip(record.coefficients())
        .fold(group.zero_q(), |acc, (share, weight)| {
            group.add_q(&acc, &group.mul_q(weight, share))
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_group() -> GroupContext {
        GroupContext::from_u64(17783595016063053623, 8891797508031526811, 2).unwrap()
    }

    #[test]
    fn honest_ceremony_succeeds() {
        let group = test_group();
        let joint_key = run_ceremony(&group).unwrap();
        assert!(group.is_valid_residue(&joint_key));
    }

    #[test]
    fn bad_share_fails_the_ceremony() {
        let group = test_group();
        let polynomial = generate_polynomial(&group, 2, &mut SecureSampler::new()).unwrap();
        let share = compute_coordinate(&group, 2, &polynomial);
        let tampered = group.add_q(&share, &group.one_q());

        assert!(check_share(&group, 1, 2, &share, &polynomial.commitments()).is_ok());
        assert!(matches!(
            check_share(&group, 1, 2, &tampered, &polynomial.commitments()),
            Err(CeremonyError::InvalidShare { sender: 1, receiver: 2 })
        ));
    }

    #[test]
    fn wrong_backups_do_not_match_secret() {
        let group = test_group();
        let polynomial = generate_polynomial(&group, 2, &mut SecureSampler::new()).unwrap();
        let mut backups: Vec<Coordinate> = [2, 3]
            .iter()
            .map(|x| compute_coordinate(&group, *x, &polynomial))
            .collect();
        assert_eq!(&recover_secret(&group, &[2, 3], &backups).unwrap(), polynomial.secret());

        backups[0] = group.add_q(&backups[0], &group.one_q());
        assert_ne!(&recover_secret(&group, &[2, 3], &backups).unwrap(), polynomial.secret());
    }

    #[test]
    fn malformed_quorum_is_an_error() {
        let group = test_group();
        let shares = vec![group.one_q(), group.one_q()];
        assert!(matches!(
            recover_secret(&group, &[2, 2], &shares),
            Err(CeremonyError::Polynomial(PolynomialError::InvalidParameter(_)))
        ));
    }

    #[test]
    fn missing_group_file_is_an_error() {
        assert!(load_group("/nonexistent/group.json").is_err());
    }
}
