use flow_network::FlowNetwork;

fn main() {
    let mut network: FlowNetwork<i64> = FlowNetwork::new();

    network.add_edge(0, 1, 7);
    network.add_edge(0, 2, 4);
    network.add_edge(1, 3, 5);
    network.add_edge(1, 4, 3);
    network.add_edge(2, 4, 2);
    network.add_edge(2, 5, 4);
    network.add_edge(3, 5, 8);
    network.add_edge(4, 5, 3);

    network.set_source(0);
    network.set_sink(5);

    println!("{}", network.prompt());
    let flow = network.dinic();
    println!("{}", network.prompt());
    assert_eq!(network.goldberg_tarjan(), flow);
    println!("{}", network.prompt());

    print!("{}", network.display_flow_network());
}
