use rand::SeedableRng;
use rand::rngs::SmallRng;

use lineage_gen::Genotype;

#[test]
fn stillbirths_are_rare_but_present() {
    let mut rng = SmallRng::seed_from_u64(7);
    let a = Genotype::randomize(&mut rng, None);
    let b = Genotype::randomize(&mut rng, None);

    let mut nonviable = 0;
    let trials = 1_000;
    for _ in 0..trials {
        let child = Genotype::descend(&mut rng, &a, &b).expect("viable parents always conceive");
        if !child.viable {
            nonviable += 1;
        }
    }
    // Base stillbirth chance is 1%; region inheritance can add a little.
    assert!(nonviable > 0, "no stillbirth in {trials} trials");
    assert!(
        nonviable < trials / 20,
        "{nonviable} stillbirths in {trials} trials is far too many"
    );
}

#[test]
fn two_achondroplasia_alleles_are_fatal() {
    let mut rng = SmallRng::seed_from_u64(8);
    let mut a = Genotype::randomize(&mut rng, None);
    let mut b = Genotype::randomize(&mut rng, None);
    a.body.achondroplasia = true;
    b.body.achondroplasia = true;

    let mut saw_fatal = false;
    let mut saw_viable = false;
    for _ in 0..200 {
        let child = Genotype::descend(&mut rng, &a, &b).unwrap();
        if child.viable {
            saw_viable = true;
        } else {
            saw_fatal = true;
        }
    }
    // Each affected parent passes the allele with an independent coin flip,
    // so both fatal and viable children must show up.
    assert!(saw_fatal, "no double-allele conception in 200 trials");
    assert!(saw_viable, "no viable child of two affected parents in 200 trials");
}

#[test]
fn children_resemble_their_parents() {
    let mut rng = SmallRng::seed_from_u64(9);
    let a = Genotype::randomize(&mut rng, None);
    let b = Genotype::randomize(&mut rng, None);
    let mean = (a.body.longevity + b.body.longevity) / 2.0;
    for _ in 0..100 {
        let child = Genotype::descend(&mut rng, &a, &b).unwrap();
        assert!(
            (child.body.longevity - mean).abs() < 1.0,
            "longevity drifted past the mutation bound"
        );
    }
}
